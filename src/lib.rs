//! unarc - archive detection and extraction
//!
//! Sniffs an archive's format from its name or leading bytes and unpacks
//! it with the matching reader. Also packs directories into ZIP and single
//! files into GZIP.

pub mod archive;
pub mod config;
