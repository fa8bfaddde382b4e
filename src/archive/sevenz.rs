//! 7-Zip reader (pure Rust, via sevenz-rust2).
//!
//! Entries are visited in archive order. Entry bytes are pulled in
//! `buffer_size` chunks and routed through a [`ChunkSink`], which opens each
//! target once and appends every later chunk for it.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sevenz_rust2::{ArchiveReader, Password};

use super::error::{Error, Result};
use super::paths::{create_dir_lenient, ensure_parent, resolve_entry};
use super::sink::ChunkSink;
use crate::config::ExtractConfig;

pub fn decompress_7z(file: &Path, dir: &Path, config: &ExtractConfig) -> Result<()> {
    let mut reader = ArchiveReader::new(File::open(file)?, Password::empty())?;
    let mut sink = ChunkSink::new();
    let mut failure: Option<Error> = None;

    reader.for_each_entries(|entry, data| {
        match write_entry(&entry.name, entry.is_directory, data, dir, config, &mut sink) {
            Ok(()) => Ok(true),
            Err(e) => {
                failure = Some(e);
                Ok(false)
            }
        }
    })?;

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn write_entry(
    name: &str,
    is_directory: bool,
    data: &mut dyn Read,
    dir: &Path,
    config: &ExtractConfig,
    sink: &mut ChunkSink,
) -> Result<()> {
    let target = resolve_entry(dir, name, config)?;
    if is_directory {
        create_dir_lenient(&target);
        return Ok(());
    }

    ensure_parent(&target);
    sink.write_from(&target, data, config.buffer_size)?;

    if sink.finish(&target)?.is_none() {
        // Empty entry: no chunk ever arrived, but the file must exist.
        File::create(&target)?;
    }
    Ok(())
}
