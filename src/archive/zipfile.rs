//! ZIP reader with the two-pass entry name strategy.
//!
//! The first pass decodes entry names in the configured legacy charset.
//! If anything in that pass fails, the whole extraction is redone assuming
//! UTF-8. Entries that carry the UTF-8 flag are decoded as UTF-8 on both
//! passes. The destination is emptied at
//! the start of every pass, so the retry starts from a clean directory.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use super::charset::NameCharset;
use super::error::Result;
use super::paths::{clean_dir, copy_bounded, create_dir_lenient, ensure_parent, resolve_entry};
use crate::config::ExtractConfig;

/// Extract a ZIP archive, retrying under UTF-8 when the legacy pass fails.
///
/// When both passes fail, both causes are logged and the first is returned.
pub fn decompress_zip(file: &Path, dir: &Path, config: &ExtractConfig) -> Result<()> {
    let legacy = NameCharset::Legacy(config.legacy_charset);

    let first = match extract_with(file, dir, legacy, config) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    debug!(charset = legacy.name(), error = %first, "ZIP pass failed, retrying as UTF-8");

    match extract_with(file, dir, NameCharset::Utf8, config) {
        Ok(()) => Ok(()),
        Err(second) => {
            warn!(charset = legacy.name(), error = %first, retry_error = %second, "*.zip");
            Err(first)
        }
    }
}

/// One extraction pass with a fixed name charset.
pub fn extract_with(
    file: &Path,
    dir: &Path,
    charset: NameCharset,
    config: &ExtractConfig,
) -> Result<()> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(file)?))?;

    if dir.exists() {
        clean_dir(dir)?;
    }

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry_charset(entry.name_raw(), entry.name(), charset).decode(entry.name_raw())?;
        let target = resolve_entry(dir, &name, config)?;

        if entry.is_dir() {
            create_dir_lenient(&target);
            continue;
        }

        ensure_parent(&target);
        let mut output = BufWriter::new(File::create(&target)?);
        copy_bounded(&mut entry, &mut output, config.buffer_size)?;
    }

    Ok(())
}

/// The zip crate reads unflagged names as CP437, which never reproduces a
/// non-ASCII byte string. A decoded name equal to its raw bytes therefore
/// came from the UTF-8 flag or an Info-ZIP Unicode Path field.
fn entry_charset(raw: &[u8], decoded: &str, pass: NameCharset) -> NameCharset {
    if decoded.as_bytes() == raw {
        NameCharset::Utf8
    } else {
        pass
    }
}
