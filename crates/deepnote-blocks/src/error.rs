//! Error types for the Deepnote format core.
//!
//! Each layer owns its error enum; [`DeepnoteError`] is what the public entry
//! points return. Ingestion failures are all rendered behind the same
//! `Failed to parse Deepnote file:` prefix so callers see one error shape no
//! matter which check tripped.

use thiserror::Error;

use crate::codegen::CodegenError;
use crate::document::DocumentError;
use crate::schema::SchemaValidationError;

/// Crate-level errors.
#[derive(Error, Debug)]
pub enum DeepnoteError {
    /// Decoding, prohibited YAML feature, or grammar failure.
    #[error("Failed to parse Deepnote file: {0}")]
    Document(#[from] DocumentError),

    /// Schema validation failed. Only the first issue is displayed.
    #[error("Failed to parse Deepnote file: {0}")]
    Schema(#[from] SchemaValidationError),

    /// The model could not be turned back into a document.
    #[error("Failed to serialize Deepnote file: {0}")]
    Serialize(String),

    /// A snapshot was requested from a file that lacks environment or execution.
    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    /// A block type reached an emitter that has no rule for it.
    #[error("Unsupported block type: {0}")]
    UnsupportedBlockType(String),

    /// A stored value could not be turned into source code.
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl DeepnoteError {
    /// All schema issues when this is a validation failure.
    pub fn validation_issues(&self) -> Option<&[crate::schema::ValidationIssue]> {
        match self {
            DeepnoteError::Schema(err) => Some(err.issues()),
            _ => None,
        }
    }
}

impl From<crate::model::MissingSnapshotSection> for DeepnoteError {
    fn from(err: crate::model::MissingSnapshotSection) -> Self {
        DeepnoteError::Snapshot(err.to_string())
    }
}

impl From<serde_yaml::Error> for DeepnoteError {
    fn from(err: serde_yaml::Error) -> Self {
        DeepnoteError::Serialize(err.to_string())
    }
}

/// Result type alias using DeepnoteError.
pub type DeepnoteResult<T> = Result<T, DeepnoteError>;
