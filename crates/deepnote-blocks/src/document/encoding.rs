//! Strict UTF-8 decoding.

use thiserror::Error;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Byte-level decoding failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The document starts with a UTF-8 byte order mark.
    #[error("document must not start with a UTF-8 byte order mark")]
    ByteOrderMark,

    /// The bytes are not valid UTF-8.
    #[error("invalid UTF-8 byte sequence at offset {offset}")]
    InvalidUtf8 { offset: usize },
}

/// Decode raw bytes as UTF-8 without replacing invalid sequences.
pub fn decode_strict(bytes: &[u8]) -> Result<&str, EncodingError> {
    if bytes.starts_with(UTF8_BOM) {
        return Err(EncodingError::ByteOrderMark);
    }

    std::str::from_utf8(bytes).map_err(|e| EncodingError::InvalidUtf8 {
        offset: e.valid_up_to(),
    })
}
