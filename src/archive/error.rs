//! Error and result types shared by every reader and the packer.

use std::io;
use std::path::PathBuf;

/// Failure kinds raised inside the engine.
///
/// Read-side operations never hand these to callers as `Err`; they are
/// logged and carried in [`ExtractionResult::cause`] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("7z error: {0}")]
    SevenZ(#[from] sevenz_rust2::Error),

    #[error("rar error: {0}")]
    Rar(#[from] unrar::error::UnrarError),

    /// The primary RAR reader can't handle this archive variant.
    #[error("unsupported RAR variant: {0}")]
    UnsupportedRar(unrar::error::UnrarError),

    #[error("couldn't create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("entry '{entry}' resolves outside the destination: {}", resolved.display())]
    PathEscape { entry: String, resolved: PathBuf },

    #[error("entry name is not valid {charset}: {name:?}")]
    Charset { charset: &'static str, name: Vec<u8> },

    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("native archive backend is unavailable")]
    BackendUnavailable,

    #[error("native archive backend failed: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of one read-side operation.
///
/// There is no partial-success state: files written before a failure stay on
/// disk, but `success` is `false`.
#[derive(Debug)]
pub struct ExtractionResult {
    pub success: bool,
    pub cause: Option<Error>,
}

impl ExtractionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            cause: None,
        }
    }

    pub fn failed(cause: Error) -> Self {
        Self {
            success: false,
            cause: Some(cause),
        }
    }

    /// Failure with nothing more to report (missing input, unknown format).
    pub fn rejected() -> Self {
        Self {
            success: false,
            cause: None,
        }
    }
}

impl From<Result<()>> for ExtractionResult {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failed(e),
        }
    }
}
