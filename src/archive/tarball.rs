//! TAR readers: plain, gzip-wrapped and bzip2-wrapped.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use tar::{Archive, EntryType};
use tracing::debug;

use super::error::{Error, Result};
use super::paths::{copy_bounded, create_dir_lenient, ensure_parent, resolve_entry};
use crate::config::ExtractConfig;

/// How a failed directory creation is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirPolicy {
    /// Plain `.tar`: fail the extraction.
    Strict,
    /// Compressed tarballs: ignore and carry on.
    Lenient,
}

pub fn decompress_tar(file: &Path, dir: &Path, config: &ExtractConfig) -> Result<()> {
    let input = BufReader::new(File::open(file)?);
    unpack(input, dir, config, DirPolicy::Strict)
}

pub fn decompress_tar_gz(file: &Path, dir: &Path, config: &ExtractConfig) -> Result<()> {
    let input = MultiGzDecoder::new(BufReader::new(File::open(file)?));
    unpack(input, dir, config, DirPolicy::Lenient)
}

pub fn decompress_tar_bz2(file: &Path, dir: &Path, config: &ExtractConfig) -> Result<()> {
    let input = BzDecoder::new(BufReader::new(File::open(file)?));
    unpack(input, dir, config, DirPolicy::Lenient)
}

fn unpack<R: Read>(reader: R, dir: &Path, config: &ExtractConfig, policy: DirPolicy) -> Result<()> {
    let mut archive = Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        let target = resolve_entry(dir, &name, config)?;

        match entry.header().entry_type() {
            EntryType::Directory => match policy {
                DirPolicy::Strict => {
                    if !target.exists() {
                        fs::create_dir_all(&target).map_err(|source| Error::CreateDir {
                            path: target.clone(),
                            source,
                        })?;
                    }
                }
                DirPolicy::Lenient => create_dir_lenient(&target),
            },
            EntryType::Regular | EntryType::Continuous => {
                ensure_parent(&target);
                // File::create truncates, so existing files are overwritten.
                let mut output = BufWriter::new(File::create(&target)?);
                copy_bounded(&mut entry, &mut output, config.buffer_size)?;
            }
            other => {
                debug!(entry = %name, kind = ?other, "Skipping non-file tar entry");
            }
        }
    }

    Ok(())
}
