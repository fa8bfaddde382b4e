//! Archive creation (ZIP and GZIP).
//!
//! Unlike the readers, the ZIP packers propagate the first error instead of
//! flattening it to `false`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Seek, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::error::Result;

/// Zip every file under `source` into `output`. Entry names are relative to
/// `source`, so the archive has no top-level folder.
pub fn zip_dir(source: &Path, output: &Path) -> Result<()> {
    let mut zip = ZipWriter::new(BufWriter::new(File::create(output)?));
    let count = add_tree(&mut zip, source, None)?;
    zip.finish()?.flush()?;
    debug!(source = %source.display(), files = count, "Zipped directory");
    Ok(())
}

/// Zip a mix of directories and files into `output`.
///
/// Directories keep their own name as a top-level folder; files are stored
/// under their file name. Returns `Ok(false)` when `sources` is empty.
pub fn zip_files<P: AsRef<Path>>(output: &Path, sources: &[P]) -> Result<bool> {
    if sources.is_empty() {
        return Ok(false);
    }

    let mut zip = ZipWriter::new(BufWriter::new(File::create(output)?));
    for source in sources {
        let source = source.as_ref();
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if source.is_dir() {
            add_tree(&mut zip, source, Some(&name))?;
        } else {
            add_file(&mut zip, source, &name)?;
        }
    }
    zip.finish()?.flush()?;
    Ok(true)
}

/// Gzip `source` into `output`. Any I/O error yields `false`.
pub fn gzip(source: &Path, output: &Path) -> bool {
    match gzip_file(source, output) {
        Ok(bytes) => {
            debug!(source = %source.display(), bytes, "Gzipped file");
            true
        }
        Err(e) => {
            warn!(source = %source.display(), error = %e, "*.gz");
            false
        }
    }
}

fn gzip_file(source: &Path, output: &Path) -> io::Result<u64> {
    let mut input = BufReader::new(File::open(source)?);
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(output)?), Compression::default());
    let bytes = io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.flush()?;
    Ok(bytes)
}

fn add_tree<W: Write + Seek>(zip: &mut ZipWriter<W>, root: &Path, prefix: Option<&str>) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        add_file(zip, entry.path(), &entry_name(relative, prefix))?;
        count += 1;
    }
    Ok(count)
}

fn add_file<W: Write + Seek>(zip: &mut ZipWriter<W>, path: &Path, name: &str) -> Result<()> {
    let size = path.metadata()?.len();
    let options = SimpleFileOptions::default().large_file(size >= u64::from(u32::MAX));
    zip.start_file(name, options)?;
    io::copy(&mut BufReader::new(File::open(path)?), zip)?;
    Ok(())
}

/// Slash-separated entry name, optionally under `prefix/`.
fn entry_name(relative: &Path, prefix: Option<&str>) -> String {
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    match prefix {
        Some(prefix) => format!("{}/{}", prefix, joined),
        None => joined,
    }
}
