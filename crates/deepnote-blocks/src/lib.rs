//! Deepnote Project Format Library
//!
//! This crate reads, validates, writes and compiles `.deepnote` documents:
//!
//! - **Strict ingestion**: UTF-8 only, no byte order mark, no YAML anchors,
//!   aliases, merge keys, explicit tags or repeated keys
//! - **Schema validation**: a typed model with path-qualified issues
//! - **Canonical serialization**: deterministic YAML with positional sorting keys
//! - **Code generation**: Python source for every executable block type
//! - **Markup**: Markdown for text cells and the reverse stripping
//!
//! ## Modules
//!
//! - [`config`]: Parser limits loaded from environment variables
//! - [`document`]: Encoding checks, prohibited features and the YAML grammar
//! - [`schema`]: Validation of the generic tree into the model
//! - [`model`]: File, notebook and block types
//! - [`serialize`]: Canonical YAML output
//! - [`codegen`]: Python emitters per block type
//! - [`markup`]: Markdown emit and strip for presentation blocks
//! - [`escape`]: Python and Markdown escaping helpers
//! - [`error`]: Error types
//!
//! ## Example
//!
//! ```ignore
//! use deepnote_blocks::{deserialize_file, emit_notebook_source, EmitContext};
//!
//! let file = deserialize_file(&std::fs::read_to_string("project.deepnote")?)?;
//! let notebook = &file.project.notebooks[0];
//! println!("{}", emit_notebook_source(notebook, &EmitContext::default())?);
//! ```

pub mod codegen;
pub mod config;
pub mod document;
pub mod error;
pub mod escape;
pub mod markup;
pub mod model;
pub mod schema;
pub mod serialize;

use tracing::debug;

pub use codegen::{emit_notebook_source, emit_source, CodegenError, EmitContext};
pub use config::ParserConfig;
pub use document::{decode_strict, parse, parse_bytes, parse_with, DocumentError};
pub use error::{DeepnoteError, DeepnoteResult};
pub use markup::{emit_markup, strip_markup};
pub use model::{Block, BlockType, DeepnoteFile, DeepnoteSnapshot, Notebook};
pub use schema::{validate, SchemaValidationError, ValidationIssue};
pub use serialize::{generate_sorting_key, serialize_file, serialize_snapshot};

/// Parse and validate document text with the default limits.
pub fn deserialize_file(text: &str) -> DeepnoteResult<DeepnoteFile> {
    deserialize_file_with(text, &ParserConfig::default())
}

/// Parse and validate document text.
pub fn deserialize_file_with(text: &str, config: &ParserConfig) -> DeepnoteResult<DeepnoteFile> {
    let tree = document::parse_with(text, config)?;
    let file = schema::validate(&tree)?;
    debug!(
        notebooks = file.project.notebooks.len(),
        blocks = file.blocks().count(),
        "Deserialized Deepnote file"
    );
    Ok(file)
}

/// Parse and validate a snapshot: a file that also carries `environment`
/// and `execution`.
pub fn deserialize_snapshot(text: &str) -> DeepnoteResult<DeepnoteSnapshot> {
    let file = deserialize_file(text)?;
    Ok(DeepnoteSnapshot::try_from(file)?)
}
