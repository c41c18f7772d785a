//! Parser configuration.

use serde::Deserialize;

/// Ingestion limits loaded from environment variables.
///
/// Environment variables are prefixed with `DEEPNOTE_`:
/// - `DEEPNOTE_MAX_DOCUMENT_BYTES`: largest accepted document (default: 50 MiB)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ParserConfig {
    /// Documents longer than this many bytes are rejected before parsing.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
}

fn default_max_document_bytes() -> usize {
    50 * 1024 * 1024
}

impl ParserConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `DEEPNOTE_`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("DEEPNOTE_").from_env::<ParserConfig>()
    }

    /// Config with an explicit document size limit.
    pub fn with_max_document_bytes(max_document_bytes: usize) -> Self {
        Self { max_document_bytes }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: default_max_document_bytes(),
        }
    }
}
