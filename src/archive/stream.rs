//! Single-stream decompressors (`.gz`, `.bz2`).
//!
//! The output is a sibling of the archive's name with the last suffix
//! stripped, written into the destination directory.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use tracing::debug;

use super::error::Result;
use super::paths::{copy_bounded, ensure_parent, resolve_entry, strip_last_suffix};
use crate::config::ExtractConfig;

/// Decompress a gzip file into `dir`.
pub fn decompress_gz(file: &Path, dir: &Path, config: &ExtractConfig) -> Result<()> {
    let input = BufReader::new(File::open(file)?);
    write_stream(MultiGzDecoder::new(input), file, dir, config)
}

/// Decompress a bzip2 file into `dir`.
pub fn decompress_bz2(file: &Path, dir: &Path, config: &ExtractConfig) -> Result<()> {
    let input = BufReader::new(File::open(file)?);
    write_stream(BzDecoder::new(input), file, dir, config)
}

/// Target for the decompressed stream of `file`.
pub fn output_path(file: &Path, dir: &Path, config: &ExtractConfig) -> Result<PathBuf> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    resolve_entry(dir, strip_last_suffix(&name), config)
}

fn write_stream<R: Read>(
    mut decoder: R,
    file: &Path,
    dir: &Path,
    config: &ExtractConfig,
) -> Result<()> {
    let target = output_path(file, dir, config)?;
    ensure_parent(&target);

    let mut output = BufWriter::new(File::create(&target)?);
    let written = copy_bounded(&mut decoder, &mut output, config.buffer_size)?;
    debug!(target = %target.display(), bytes = written, "Stream decompressed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_gz_strips_last_suffix() -> Result<()> {
        let dir = tempdir()?;
        let archive = dir.path().join("notes.txt.gz");
        {
            let mut encoder = flate2::write::GzEncoder::new(
                File::create(&archive)?,
                flate2::Compression::default(),
            );
            encoder.write_all(b"hello gzip")?;
            encoder.finish()?;
        }

        let out = dir.path().join("out");
        decompress_gz(&archive, &out, &ExtractConfig::default())?;

        assert_eq!(std::fs::read(out.join("notes.txt"))?, b"hello gzip");
        Ok(())
    }

    #[test]
    fn test_bz2_strips_last_suffix() -> Result<()> {
        let dir = tempdir()?;
        let archive = dir.path().join("data.csv.bz2");
        let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 97) as u8).collect();
        {
            let mut encoder =
                bzip2::write::BzEncoder::new(File::create(&archive)?, bzip2::Compression::default());
            encoder.write_all(&payload)?;
            encoder.finish()?;
        }

        let out = dir.path().join("out");
        decompress_bz2(&archive, &out, &ExtractConfig::default())?;

        assert_eq!(std::fs::read(out.join("data.csv"))?, payload);
        Ok(())
    }

    #[test]
    fn test_name_without_dot_is_kept() {
        let config = ExtractConfig::default();
        let target = output_path(Path::new("/in/mygz"), Path::new("/out"), &config).unwrap();
        assert_eq!(target, Path::new("/out/mygz"));
    }

    #[test]
    fn test_corrupt_gz_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let archive = dir.path().join("broken.gz");
        std::fs::write(&archive, b"\x1f\x8b\x08\x00garbage")?;

        let result = decompress_gz(&archive, &dir.path().join("out"), &ExtractConfig::default());
        assert!(result.is_err());
        Ok(())
    }
}
