//! Strict document ingestion.
//!
//! Turns untrusted text into a generic tree in three checks, all of which run
//! before any structure is handed back:
//! - encoding: no byte order mark, strict UTF-8
//! - prohibited features: no anchors, aliases, merge keys or explicit tags
//! - grammar: YAML syntax, with repeated mapping keys rejected while parsing

pub mod encoding;
pub mod features;
mod value;

use thiserror::Error;
use tracing::debug;

use crate::config::ParserConfig;

pub use encoding::{decode_strict, EncodingError};
pub use features::{find_prohibited_feature, FeatureLocation, ProhibitedFeature};

/// The untyped document tree handed to schema validation.
pub type GenericValue = serde_json::Value;

/// Ingestion failures.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// BOM or invalid UTF-8.
    #[error("{0}")]
    Encoding(#[from] EncodingError),

    /// Anchor, alias, merge key or explicit tag.
    #[error("YAML {feature} is not allowed (line {line}, column {column})")]
    ProhibitedFeature {
        feature: ProhibitedFeature,
        line: usize,
        column: usize,
    },

    /// The document exceeds the configured size limit.
    #[error("document is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    /// Grammar violation or duplicate key.
    #[error("invalid YAML: {0}")]
    Parse(String),
}

impl From<FeatureLocation> for DocumentError {
    fn from(found: FeatureLocation) -> Self {
        DocumentError::ProhibitedFeature {
            feature: found.feature,
            line: found.line,
            column: found.column,
        }
    }
}

/// Parse document text into a generic tree using the default limits.
pub fn parse(text: &str) -> Result<GenericValue, DocumentError> {
    parse_with(text, &ParserConfig::default())
}

/// Parse document text into a generic tree.
pub fn parse_with(text: &str, config: &ParserConfig) -> Result<GenericValue, DocumentError> {
    if text.len() > config.max_document_bytes {
        return Err(DocumentError::TooLarge {
            size: text.len(),
            limit: config.max_document_bytes,
        });
    }

    if text.starts_with('\u{feff}') {
        return Err(EncodingError::ByteOrderMark.into());
    }

    if let Some(found) = find_prohibited_feature(text) {
        return Err(found.into());
    }

    let value::StrictValue(tree) =
        serde_yaml::from_str(text).map_err(|e| DocumentError::Parse(e.to_string()))?;

    debug!(bytes = text.len(), "Parsed document tree");
    Ok(tree)
}

/// Decode raw bytes and parse them into a generic tree.
pub fn parse_bytes(bytes: &[u8], config: &ParserConfig) -> Result<GenericValue, DocumentError> {
    let text = decode_strict(bytes)?;
    parse_with(text, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_simple_document() {
        let value = parse("version: '1.0'\nproject:\n  name: demo\n").unwrap();
        assert_eq!(value, json!({"version": "1.0", "project": {"name": "demo"}}));
    }

    #[test]
    fn test_parse_rejects_bom_in_text() {
        let err = parse("\u{feff}version: '1.0'\n").unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Encoding(EncodingError::ByteOrderMark)
        ));
    }

    #[test]
    fn test_parse_bytes_rejects_invalid_utf8() {
        let err = parse_bytes(&[b'a', b':', b' ', 0xC3], &ParserConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Encoding(EncodingError::InvalidUtf8 { offset: 3 })
        ));
    }

    #[test]
    fn test_parse_rejects_alias() {
        let err = parse("a: &x 1\nb: *x\n").unwrap_err();
        match err {
            DocumentError::ProhibitedFeature { feature, line, .. } => {
                assert_eq!(feature, ProhibitedFeature::Anchor);
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_duplicate_keys() {
        let err = parse("project:\n  id: a\n  id: b\n").unwrap_err();
        assert!(matches!(err, DocumentError::Parse(_)));
        assert!(err.to_string().contains("duplicate key"));
    }

    #[test]
    fn test_parse_rejects_grammar_error() {
        let err = parse("a: [1, 2\n").unwrap_err();
        assert!(matches!(err, DocumentError::Parse(_)));
    }

    #[test]
    fn test_parse_respects_size_limit() {
        let config = ParserConfig::with_max_document_bytes(8);
        let err = parse_with("version: '1.0'\n", &config).unwrap_err();
        assert!(matches!(err, DocumentError::TooLarge { limit: 8, .. }));
    }

    #[test]
    fn test_json_flow_mapping_cannot_smuggle_alias_or_tag() {
        let err = parse("a: {\"b\":&x [1, 2], \"c\":*x}\n").unwrap_err();
        assert!(matches!(
            err,
            DocumentError::ProhibitedFeature {
                feature: ProhibitedFeature::Anchor,
                ..
            }
        ));

        let err = parse("{\"version\":!!str 1}\n").unwrap_err();
        assert!(matches!(
            err,
            DocumentError::ProhibitedFeature {
                feature: ProhibitedFeature::Tag,
                ..
            }
        ));

        let err = parse("{'b':*x}\n").unwrap_err();
        assert!(matches!(
            err,
            DocumentError::ProhibitedFeature {
                feature: ProhibitedFeature::Alias,
                ..
            }
        ));
    }

    #[test]
    fn test_plain_multiline_value_with_asterisks_is_accepted() {
        let value = parse("content: first line\n  *second* line\n").unwrap();
        assert_eq!(value, json!({"content": "first line *second* line"}));
    }

    #[test]
    fn test_markdown_emphasis_in_quoted_content_is_accepted() {
        let value = parse("content: '*bold* & __under__'\n").unwrap();
        assert_eq!(value["content"], "*bold* & __under__");
    }
}
