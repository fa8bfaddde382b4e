//! Entry name decoding for ZIP archives.
//!
//! ZIP names written by legacy tools are raw bytes in whatever code page the
//! writer used. Decoding is strict: a name that isn't valid in the chosen
//! charset is an error rather than a string full of replacement characters.

use encoding_rs::Encoding;

use super::error::{Error, Result};

/// Charset used for one extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCharset {
    /// A legacy multi-byte code page (GBK by default).
    Legacy(&'static Encoding),
    Utf8,
}

impl NameCharset {
    pub fn name(&self) -> &'static str {
        match self {
            NameCharset::Legacy(encoding) => encoding.name(),
            NameCharset::Utf8 => "UTF-8",
        }
    }

    pub fn decode(&self, raw: &[u8]) -> Result<String> {
        let decoded = match self {
            NameCharset::Legacy(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(raw)
                .map(|name| name.into_owned()),
            NameCharset::Utf8 => std::str::from_utf8(raw).ok().map(str::to_owned),
        };

        decoded.ok_or_else(|| Error::Charset {
            charset: self.name(),
            name: raw.to_vec(),
        })
    }
}
