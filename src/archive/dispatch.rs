//! Maps a detected [`FileType`] to its reader and flattens the outcome.

use std::path::Path;

use tracing::{debug, warn};

use super::detect::{classify, FileType};
use super::error::ExtractionResult;
use super::{rar, sevenz, stream, tarball, zipfile};
use crate::config::ExtractConfig;

/// Classify `file` and extract it into `dir`. Never panics, never returns
/// an error: every failure is logged and reported through the result.
pub fn decompress_detailed(file: &Path, dir: &Path, config: &ExtractConfig) -> ExtractionResult {
    if let Err(e) = config.validate() {
        warn!(archive = %file.display(), error = %e, "Refusing to extract");
        return ExtractionResult::failed(e.into());
    }

    if !file.exists() {
        debug!(archive = %file.display(), "Archive does not exist");
        return ExtractionResult::rejected();
    }

    let file_type = classify(file);
    let result = match file_type {
        FileType::Zip => zipfile::decompress_zip(file, dir, config),
        FileType::TarGz => tarball::decompress_tar_gz(file, dir, config),
        FileType::TarBz2 => tarball::decompress_tar_bz2(file, dir, config),
        FileType::Bz2 => stream::decompress_bz2(file, dir, config),
        FileType::SevenZ => sevenz::decompress_7z(file, dir, config),
        FileType::Rar => rar::decompress_rar(file, dir, config),
        FileType::Gz => stream::decompress_gz(file, dir, config),
        FileType::Tar => tarball::decompress_tar(file, dir, config),
        FileType::Unknown => {
            debug!(archive = %file.display(), "Not a recognized archive");
            return ExtractionResult::rejected();
        }
    };

    if let Err(e) = &result {
        warn!(archive = %file.display(), error = %e, "*.{}", file_type);
    }
    result.into()
}

/// [`decompress_detailed`] reduced to its success flag.
pub fn decompress_with(file: &Path, dir: &Path, config: &ExtractConfig) -> bool {
    decompress_detailed(file, dir, config).success
}

pub fn decompress(file: &Path, dir: &Path) -> bool {
    decompress_with(file, dir, &ExtractConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::error::Error;
    use crate::archive::pack;
    use crate::config::ConfigError;
    use anyhow::Result;
    use std::collections::BTreeMap;
    use std::fs::{self, File};
    use tempfile::tempdir;
    use walkdir::WalkDir;

    /// Relative path -> contents for every file under `root`.
    fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
                (rel, fs::read(e.path()).unwrap())
            })
            .collect()
    }

    fn sample_tree(root: &Path) -> Result<()> {
        fs::create_dir_all(root.join("docs/guides"))?;
        fs::write(root.join("readme.md"), b"# readme")?;
        fs::write(root.join("docs/guides/intro.txt"), b"intro")?;
        fs::write(root.join("docs/data.bin"), (0..=255u8).cycle().take(9000).collect::<Vec<_>>())?;
        Ok(())
    }

    #[test]
    fn test_zip_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let src = dir.path().join("src");
        sample_tree(&src)?;

        let archive = dir.path().join("out.zip");
        pack::zip_dir(&src, &archive)?;

        let dest = dir.path().join("dest");
        assert!(decompress(&archive, &dest));
        assert_eq!(snapshot(&dest), snapshot(&src));
        Ok(())
    }

    #[test]
    fn test_zip_twice_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let src = dir.path().join("src");
        sample_tree(&src)?;
        let archive = dir.path().join("out.zip");
        pack::zip_dir(&src, &archive)?;

        let dest = dir.path().join("dest");
        assert!(decompress(&archive, &dest));
        let first = snapshot(&dest);
        fs::write(dest.join("extra.txt"), b"added between runs")?;
        assert!(decompress(&archive, &dest));
        assert_eq!(snapshot(&dest), first);
        Ok(())
    }

    #[test]
    fn test_gzip_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let source = dir.path().join("report.csv");
        fs::write(&source, b"a,b,c\n1,2,3\n")?;
        let archive = dir.path().join("report.csv.gz");
        assert!(pack::gzip(&source, &archive));

        let dest = dir.path().join("dest");
        assert!(decompress(&archive, &dest));
        assert_eq!(fs::read(dest.join("report.csv"))?, b"a,b,c\n1,2,3\n");
        Ok(())
    }

    #[test]
    fn test_missing_file_does_not_create_destination() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("dest");
        let result = decompress_detailed(&dir.path().join("gone.zip"), &dest, &ExtractConfig::default());
        assert!(!result.success);
        assert!(result.cause.is_none());
        assert!(!dest.exists());
    }

    #[test]
    fn test_unknown_format_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("notes");
        fs::write(&file, b"just some text")?;
        assert!(!decompress(&file, &dir.path().join("dest")));
        Ok(())
    }

    #[test]
    fn test_empty_archives_succeed() -> Result<()> {
        let dir = tempdir()?;

        let zip_path = dir.path().join("empty.zip");
        zip::ZipWriter::new(File::create(&zip_path)?).finish()?;
        assert!(decompress(&zip_path, &dir.path().join("z")));

        let tar_path = dir.path().join("empty.tar");
        tar::Builder::new(File::create(&tar_path)?).into_inner()?;
        assert!(decompress(&tar_path, &dir.path().join("t")));
        Ok(())
    }

    #[test]
    fn test_tar_through_dispatcher() -> Result<()> {
        let dir = tempdir()?;
        let archive = dir.path().join("bundle.tar");
        {
            let mut builder = tar::Builder::new(File::create(&archive)?);
            let mut dir_header = tar::Header::new_gnu();
            dir_header.set_entry_type(tar::EntryType::Directory);
            dir_header.set_size(0);
            dir_header.set_mode(0o755);
            builder.append_data(&mut dir_header, "data/", std::io::empty())?;
            let mut header = tar::Header::new_gnu();
            header.set_size(8);
            header.set_mode(0o644);
            builder.append_data(&mut header, "data/readme.txt", &b"12345678"[..])?;
            builder.finish()?;
        }

        let dest = dir.path().join("dest");
        assert!(decompress(&archive, &dest));
        assert_eq!(fs::read(dest.join("data/readme.txt"))?, b"12345678");
        Ok(())
    }

    #[test]
    fn test_non_ascii_names_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("资料"))?;
        fs::write(src.join("中文.txt"), b"zhongwen")?;
        fs::write(src.join("资料/说明.md"), b"notes")?;
        fs::write(src.join("plain.txt"), b"ascii")?;

        let archive = dir.path().join("out.zip");
        pack::zip_dir(&src, &archive)?;

        let dest = dir.path().join("dest");
        assert!(decompress(&archive, &dest));
        assert_eq!(snapshot(&dest), snapshot(&src));
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let src = dir.path().join("src");
        fs::create_dir_all(&src)?;
        fs::write(src.join("a.txt"), b"13 bytes here")?;
        let archive = dir.path().join("a.7z");
        sevenz_rust2::compress_to_path(&src, &archive)?;

        let config = ExtractConfig {
            buffer_size: 0,
            ..Default::default()
        };
        let dest = dir.path().join("dest");
        let result = decompress_detailed(&archive, &dest, &config);

        assert!(!result.success);
        assert!(matches!(
            result.cause,
            Some(Error::Config(ConfigError::ZeroBufferSize))
        ));
        assert!(!decompress_with(&archive, &dest, &config));
        assert!(!dest.join("a.txt").exists());
        Ok(())
    }

    #[test]
    fn test_corrupt_archive_reports_cause() -> Result<()> {
        let dir = tempdir()?;
        let archive = dir.path().join("broken.tar.gz");
        fs::write(&archive, b"not gzip at all")?;

        let result = decompress_detailed(&archive, &dir.path().join("dest"), &ExtractConfig::default());
        assert!(!result.success);
        assert!(result.cause.is_some());
        Ok(())
    }
}
