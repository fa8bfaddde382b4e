//! Native 7-Zip backend, used when the primary RAR reader gives up on an
//! archive variant.
//!
//! The backend is a 7-Zip executable resolved once per process. Resolution
//! checks, in order:
//!
//! - `bin/7zz`, `7zz`, ... next to the running executable
//! - the system `PATH`
//!
//! A candidate is "loaded" when `7z i` exits successfully. A failed
//! initialization is not sticky: the next call tries again. An explicit
//! `ExtractConfig::sevenzip_path` is probed on every call instead and never
//! touches the process-wide state.
//!
//! Extraction is best-effort per item. Items are listed with
//! `7z l -slt -ba`, folders are skipped, and every file is pulled through
//! `7z e -so` in `buffer_size` chunks. An item that fails is logged and the
//! loop moves on; only a failure to open/list the archive fails the call.
//!
//! # 7z Commands Reference
//!
//! - List items: `7zz l -slt -ba -scsUTF-8 -trar5 archive.rar`
//!   - `-slt`: Technical listing (key=value format)
//!   - `-ba`: Bare output (no headers)
//! - Extract one item to stdout: `7zz e -so -bd -y -spd -trar5 archive.rar "path"`
//!   - `-so`: Write to stdout
//!   - `-spd`: Disable wildcard matching

use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Mutex, MutexGuard};

use tracing::{error, info, warn};

use super::error::{Error, Result};
use super::paths::{ensure_parent, resolve_entry};
use super::sink::ChunkSink;
use crate::config::ExtractConfig;

/// Container format handed to the backend's `-t` switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFormat {
    Rar5,
    Rar,
    SevenZip,
    Zip,
}

impl NativeFormat {
    pub fn type_switch(&self) -> &'static str {
        match self {
            NativeFormat::Rar5 => "-trar5",
            NativeFormat::Rar => "-trar",
            NativeFormat::SevenZip => "-t7z",
            NativeFormat::Zip => "-tzip",
        }
    }
}

impl fmt::Display for NativeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NativeFormat::Rar5 => "RAR5",
            NativeFormat::Rar => "RAR",
            NativeFormat::SevenZip => "7Z",
            NativeFormat::Zip => "ZIP",
        };
        f.write_str(name)
    }
}

/// Process-wide backend lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendState {
    Uninitialized,
    Ready(PathBuf),
    Unavailable,
}

static BACKEND: Mutex<BackendState> = Mutex::new(BackendState::Uninitialized);

fn lock_backend() -> MutexGuard<'static, BackendState> {
    // The state is a plain value; a panic elsewhere can't leave it torn.
    BACKEND.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Current backend state, without attempting initialization.
pub fn backend_state() -> BackendState {
    lock_backend().clone()
}

#[cfg(windows)]
const EXE_NAMES: &[&str] = &["7z.exe", "7za.exe"];
#[cfg(not(windows))]
const EXE_NAMES: &[&str] = &["7zz", "7zzs", "7z", "7za"];

/// Make sure the backend is loaded, trying again if an earlier attempt
/// failed. Returns the executable on success.
pub fn ensure_backend(config: &ExtractConfig) -> Option<PathBuf> {
    if let Some(path) = &config.sevenzip_path {
        return load(path).then(|| path.clone());
    }

    let mut state = lock_backend();
    if let BackendState::Ready(path) = &*state {
        return Some(path.clone());
    }

    warn!("Native archive backend not initialized");
    let loaded = candidates().into_iter().find(|candidate| load(candidate));

    *state = match &loaded {
        Some(path) => BackendState::Ready(path.clone()),
        None => {
            warn!("Native archive backend unsupported on this system");
            BackendState::Unavailable
        }
    };
    loaded
}

fn load(candidate: &Path) -> bool {
    info!(candidate = %candidate.display(), "Trying to load native archive backend");
    match probe(candidate) {
        Ok(()) => true,
        Err(e) => {
            warn!(candidate = %candidate.display(), error = %e, "Loading native archive backend failed");
            false
        }
    }
}

/// Platform-specific executable locations, most specific first.
fn candidates() -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = Vec::new();

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            for name in EXE_NAMES {
                found.push(exe_dir.join("bin").join(name));
                found.push(exe_dir.join(name));
            }
        }
    }

    for name in EXE_NAMES {
        if let Ok(path) = which::which(name) {
            found.push(path);
        }
    }

    found.retain(|path| path.is_file());
    found.dedup();
    found
}

fn probe(bin: &Path) -> io::Result<()> {
    let status = Command::new(bin)
        .arg("i")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("`{} i` exited with {}", bin.display(), status)))
    }
}

/// One item as reported by the backend's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeItem {
    /// Path within the archive
    pub path: String,
    /// Uncompressed size in bytes
    pub size: u64,
    pub is_folder: bool,
}

/// Per-call tally. Failed items don't fail the call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NativeSummary {
    pub extracted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Extract `file` into `dir` with the native backend.
///
/// Returns `false` if the backend can't be loaded or the archive can't be
/// opened; individual item failures are only logged.
pub fn extract(file: &Path, dir: &Path, format: NativeFormat) -> bool {
    match extract_with(file, dir, format, &ExtractConfig::default()) {
        Ok(_) => true,
        Err(e) => {
            error!(archive = %file.display(), error = %e, "Extract failed");
            false
        }
    }
}

pub fn extract_with(
    file: &Path,
    dir: &Path,
    format: NativeFormat,
    config: &ExtractConfig,
) -> Result<NativeSummary> {
    let bin = ensure_backend(config).ok_or(Error::BackendUnavailable)?;

    if !file.is_file() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("archive not found: {}", file.display()),
        )));
    }

    info!(archive = %file.display(), dest = %dir.display(), %format, "Extract");
    let items = list_items(&bin, file, format)?;
    info!(count = items.len(), "Extract: items listed");

    let mut summary = NativeSummary::default();
    let mut sink = ChunkSink::new();

    for item in &items {
        if item.is_folder {
            summary.skipped += 1;
            continue;
        }

        let target = match resolve_entry(dir, &item.path, config) {
            Ok(target) => target,
            Err(e) => {
                error!(item = %item.path, error = %e, "Error extracting item");
                summary.failed += 1;
                continue;
            }
        };
        ensure_parent(&target);

        match extract_item(&bin, file, format, item, &target, config, &mut sink) {
            Ok(size) => {
                info!("{} | {:>10}", item.path, size);
                summary.extracted += 1;
            }
            Err(e) => {
                error!(item = %item.path, error = %e, "Error extracting item");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// List every item in the archive, folders included, in archive order.
pub fn list_items(bin: &Path, file: &Path, format: NativeFormat) -> Result<Vec<NativeItem>> {
    let output = Command::new(bin)
        .arg("l") // List
        .arg("-slt") // Technical listing format (key=value)
        .arg("-ba") // Bare output (no headers)
        .arg("-scsUTF-8") // Force UTF-8 charset for filenames
        .arg(format.type_switch())
        .arg(file)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Backend(format!(
            "7z list failed: {}",
            stderr.lines().find(|l| !l.trim().is_empty()).unwrap_or("unknown error")
        )));
    }

    Ok(parse_list(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `7z l -slt -ba` output into items.
fn parse_list(output: &str) -> Vec<NativeItem> {
    let mut items = Vec::new();
    let mut current: Option<NativeItem> = None;

    for line in output.lines() {
        let line = line.trim();
        if let Some(path) = line.strip_prefix("Path = ") {
            items.extend(current.take());
            current = Some(NativeItem {
                path: path.to_string(),
                size: 0,
                is_folder: false,
            });
        } else if let Some(item) = current.as_mut() {
            if let Some(size) = line.strip_prefix("Size = ") {
                item.size = size.parse().unwrap_or(0);
            } else if let Some(folder) = line.strip_prefix("Folder = ") {
                item.is_folder = folder == "+";
            }
        }
    }
    items.extend(current);

    items.retain(|item| !item.path.is_empty());
    items
}

/// Pull one item's bytes through `7z e -so` into the sink.
fn extract_item(
    bin: &Path,
    file: &Path,
    format: NativeFormat,
    item: &NativeItem,
    target: &Path,
    config: &ExtractConfig,
    sink: &mut ChunkSink,
) -> Result<u64> {
    let mut child = Command::new(bin)
        .arg("e")
        .arg("-so") // Write to stdout
        .arg("-bd") // Disable progress indicator
        .arg("-y") // Yes to all
        .arg("-spd") // Disable wildcard matching
        .arg("-scsUTF-8")
        .arg(format.type_switch())
        .arg(file)
        .arg(&item.path)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Backend("7z stdout not captured".to_string()))?;

    let streamed = sink.write_from(target, &mut stdout, config.buffer_size);
    drop(stdout);
    if streamed.is_err() {
        let _ = child.kill();
    }
    let status = child.wait()?;
    let written = sink.finish(target)?;
    streamed?;

    if !status.success() {
        return Err(Error::Backend(format!("7z exited with {}", status)));
    }

    match written {
        Some(size) => Ok(size),
        None => {
            File::create(target)?;
            Ok(0)
        }
    }
}
