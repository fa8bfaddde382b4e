//! Extraction configuration
//!
//! Defines the knobs shared by every reader and the native fallback.

use std::path::PathBuf;

use encoding_rs::Encoding;

/// Reference copy buffer size for streaming readers.
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Configuration for extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Bounded buffer used when streaming entry bytes to disk
    pub buffer_size: usize,

    /// Encoding tried first for ZIP entry names (UTF-8 is the retry)
    pub legacy_charset: &'static Encoding,

    /// Reject entries whose path resolves outside the destination
    pub contain_paths: bool,

    /// Explicit 7-Zip executable for the native fallback
    pub sevenzip_path: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            legacy_charset: encoding_rs::GBK,
            contain_paths: true,
            sevenzip_path: None,
        }
    }
}

impl ExtractConfig {
    /// Replace the legacy charset using a WHATWG label (`gbk`, `shift_jis`, ...).
    pub fn with_charset_label(mut self, label: &str) -> Result<Self, ConfigError> {
        self.legacy_charset = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| ConfigError::UnknownCharset(label.to_string()))?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }

        if let Some(path) = &self.sevenzip_path {
            if !path.exists() {
                return Err(ConfigError::BackendNotFound(path.clone()));
            }
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Buffer size must be greater than zero")]
    ZeroBufferSize,

    #[error("Unknown charset label: {0}")]
    UnknownCharset(String),

    #[error("7-Zip executable not found: {0}")]
    BackendNotFound(PathBuf),
}
