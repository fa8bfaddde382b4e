//! Format sniffing.
//!
//! The file name is consulted first, in a fixed priority order. Only when no
//! suffix matches are the first four bytes probed. The suffix checks for
//! `tar.bz2`, `tar` and `gz` deliberately omit the leading dot, so `mygz`
//! classifies as GZ; callers rely on this ordering and laxity.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::warn;

/// Archive/compression kind detected for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    Gz,
    Bz2,
    SevenZ,
    Rar,
    Unknown,
}

impl FileType {
    /// Short name, also used as the format tag in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Zip => "zip",
            FileType::Tar => "tar",
            FileType::TarGz => "tar.gz",
            FileType::TarBz2 => "tar.bz2",
            FileType::Gz => "gz",
            FileType::Bz2 => "bz2",
            FileType::SevenZ => "7z",
            FileType::Rar => "rar",
            FileType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// First four bytes packed big-endian with each byte sign-extended, so any
// byte >= 0x80 floods the higher bits. The 7z and gzip values below only
// make sense under that packing.
const MAGIC_ZIP: i32 = 0x504B_0304;
const MAGIC_TAR: i32 = 0x776F_7264;
const MAGIC_SEVEN_Z: i32 = -0x51;
const MAGIC_BZ2: i32 = 0x425A_6839;
const MAGIC_GZ: i32 = -0x74_F7F8;
const MAGIC_RAR: i32 = 0x5261_7221;

/// Classify a file. Never fails: anything unreadable is `Unknown`.
pub fn classify(path: &Path) -> FileType {
    if !path.exists() {
        return FileType::Unknown;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if let Some(file_type) = classify_name(&name) {
        return file_type;
    }

    match read_head(path) {
        Ok(Some(head)) => classify_magic(head),
        Ok(None) => FileType::Unknown,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unknown type");
            FileType::Unknown
        }
    }
}

/// `classify(path) != Unknown`
pub fn is_compressed(path: &Path) -> bool {
    classify(path) != FileType::Unknown
}

/// Suffix pass. `name` must already be lower-cased.
fn classify_name(name: &str) -> Option<FileType> {
    let file_type = if name.ends_with(".tar.gz") {
        FileType::TarGz
    } else if name.ends_with("tar.bz2") {
        FileType::TarBz2
    } else if name.ends_with(".zip") {
        FileType::Zip
    } else if name.ends_with(".rar") {
        FileType::Rar
    } else if name.ends_with(".7z") {
        FileType::SevenZ
    } else if name.ends_with(".bz2") {
        FileType::Bz2
    } else if name.ends_with("tar") {
        FileType::Tar
    } else if name.ends_with("gz") {
        FileType::Gz
    } else {
        return None;
    };
    Some(file_type)
}

/// Read up to four leading bytes. `None` for an empty file; a short file
/// leaves the missing bytes as zero.
fn read_head(path: &Path) -> io::Result<Option<[u8; 4]>> {
    let mut buf = Vec::with_capacity(4);
    File::open(path)?.take(4).read_to_end(&mut buf)?;
    if buf.is_empty() {
        return Ok(None);
    }

    let mut head = [0u8; 4];
    head[..buf.len()].copy_from_slice(&buf);
    Ok(Some(head))
}

fn pack_magic(head: [u8; 4]) -> i32 {
    head.iter()
        .fold(0i32, |acc, &b| (acc << 8) | i32::from(b as i8))
}

fn classify_magic(head: [u8; 4]) -> FileType {
    match pack_magic(head) {
        MAGIC_ZIP => FileType::Zip,
        MAGIC_TAR => FileType::Tar,
        MAGIC_SEVEN_Z => FileType::SevenZ,
        MAGIC_BZ2 => FileType::Bz2,
        MAGIC_GZ => FileType::Gz,
        MAGIC_RAR => FileType::Rar,
        _ => FileType::Unknown,
    }
}
