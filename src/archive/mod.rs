//! Archive detection, extraction and packing.
//!
//! Readers cover ZIP (zip crate), TAR / TAR.GZ / TAR.BZ2 (tar, flate2,
//! bzip2), bare GZ and BZ2 streams, 7z (sevenz-rust2) and RAR (unrar).
//! RAR variants the unrar reader rejects are retried through a 7-Zip
//! executable, see [`native`].

pub mod charset;
pub mod detect;
pub mod dispatch;
pub mod error;
pub mod native;
pub mod pack;
pub mod paths;
pub mod rar;
pub mod sevenz;
pub mod sink;
pub mod stream;
pub mod tarball;
pub mod zipfile;

// Re-export commonly used items for convenience
pub use detect::{classify, is_compressed, FileType};
pub use dispatch::{decompress, decompress_detailed, decompress_with};
pub use error::{Error, ExtractionResult, Result};
pub use native::{backend_state, BackendState, NativeFormat};
pub use pack::{gzip, zip_dir, zip_files};
