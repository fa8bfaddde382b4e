//! RAR reader (FFI to the unrar library).
//!
//! Archive variants the primary reader rejects as unsupported are handed to
//! the native 7-Zip backend instead of failing outright.

use std::path::Path;

use tracing::{debug, info};
use unrar::error::{Code, UnrarError};
use unrar::Archive;

use super::error::{Error, Result};
use super::native::{self, NativeFormat};
use super::paths::{create_dir_lenient, ensure_parent, resolve_entry};
use crate::config::ExtractConfig;

pub fn decompress_rar(file: &Path, dir: &Path, config: &ExtractConfig) -> Result<()> {
    let error = match extract_primary(file, dir, config) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    match fallback_format(&error) {
        Some(format) => {
            info!(
                archive = %file.display(),
                error = %error,
                "Primary RAR reader can't handle this archive, falling back to native backend"
            );
            native::extract_with(file, dir, format, config).map(|_| ())
        }
        None => Err(error),
    }
}

/// Native format to retry with after the primary reader failed, if any.
pub fn fallback_format(error: &Error) -> Option<NativeFormat> {
    match error {
        Error::UnsupportedRar(_) => Some(NativeFormat::Rar5),
        _ => None,
    }
}

/// Whether an unrar error code means "this variant isn't supported" rather
/// than "this archive is broken".
pub fn is_unsupported_variant(code: &Code) -> bool {
    matches!(code, Code::UnknownFormat | Code::EReference)
}

fn classify_error(e: UnrarError) -> Error {
    if is_unsupported_variant(&e.code) {
        Error::UnsupportedRar(e)
    } else {
        Error::Rar(e)
    }
}

fn extract_primary(file: &Path, dir: &Path, config: &ExtractConfig) -> Result<()> {
    let mut archive = Archive::new(file)
        .open_for_processing()
        .map_err(classify_error)?;

    while let Some(header) = archive.read_header().map_err(classify_error)? {
        let entry = header.entry();
        let name = entry.filename.to_string_lossy().trim().to_string();
        let target = resolve_entry(dir, &name, config)?;

        archive = if entry.is_directory() {
            create_dir_lenient(&target);
            header.skip().map_err(classify_error)?
        } else if entry.is_file() {
            ensure_parent(&target);
            debug!(entry = %name, size = entry.unpacked_size, "Extracting RAR entry");
            header.extract_to(&target).map_err(classify_error)?
        } else {
            header.skip().map_err(classify_error)?
        };
    }

    Ok(())
}
