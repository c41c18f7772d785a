//! Canonical serializer.
//!
//! Sorting keys are always rebuilt from block positions, and the normalized
//! model is checked against the ingestion schema before it is written, so
//! anything this module emits parses back to the same model.

use tracing::debug;

use crate::error::{DeepnoteError, DeepnoteResult};
use crate::model::{DeepnoteFile, DeepnoteSnapshot};
use crate::schema;

/// Sorting key for the block at `index` within its notebook.
pub fn generate_sorting_key(index: usize) -> String {
    format!("{:06}", index)
}

/// Copy of `file` with every block's sorting key derived from its position.
pub fn normalize_sorting_keys(file: &DeepnoteFile) -> DeepnoteFile {
    let mut normalized = file.clone();
    let mut rewritten = 0usize;
    for notebook in &mut normalized.project.notebooks {
        for (index, block) in notebook.blocks.iter_mut().enumerate() {
            let key = generate_sorting_key(index);
            let header = block.header_mut();
            if header.sorting_key != key {
                header.sorting_key = key;
                rewritten += 1;
            }
        }
    }
    if rewritten > 0 {
        debug!(rewritten, "Rewrote block sorting keys");
    }
    normalized
}

/// Write a file as canonical YAML.
pub fn serialize_file(file: &DeepnoteFile) -> DeepnoteResult<String> {
    let normalized = normalize_sorting_keys(file);

    let tree = serde_json::to_value(&normalized)
        .map_err(|e| DeepnoteError::Serialize(e.to_string()))?;
    let checked = schema::validate(&tree).map_err(|e| {
        DeepnoteError::Serialize(format!("normalized document does not validate: {}", e))
    })?;

    Ok(serde_yaml::to_string(&checked)?)
}

/// Write a snapshot as canonical YAML.
pub fn serialize_snapshot(snapshot: &DeepnoteSnapshot) -> DeepnoteResult<String> {
    serialize_file(snapshot.file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserialize_file;

    const SAMPLE: &str = r#"
version: 1.0.0
metadata:
  createdAt: '2024-06-01T12:00:00.000Z'
project:
  name: Sales
  id: proj-1
  notebooks:
    - name: Main
      id: nb-1
      blocks:
        - type: code
          id: b-2
          sortingKey: zz
          blockGroup: g-2
          content: |-
            total = 1
            print(total)
          metadata:
            custom_flag: true
            execution_millis: 12
        - id: b-1
          type: text-cell-h1
          blockGroup: g-1
          sortingKey: a
          content: Heading
"#;

    #[test]
    fn test_sorting_keys() {
        assert_eq!(generate_sorting_key(0), "000000");
        assert_eq!(generate_sorting_key(42), "000042");
        assert_eq!(generate_sorting_key(1_000_000), "1000000");
    }

    #[test]
    fn test_serialize_rewrites_sorting_keys_and_orders_fields() {
        let file = deserialize_file(SAMPLE).unwrap();
        let out = serialize_file(&file).unwrap();

        let reparsed = deserialize_file(&out).unwrap();
        let keys: Vec<&str> = reparsed.project.notebooks[0]
            .blocks
            .iter()
            .map(|b| b.header().sorting_key.as_str())
            .collect();
        assert_eq!(keys, vec!["000000", "000001"]);

        let metadata_at = out.find("metadata:").unwrap();
        let project_at = out.find("project:").unwrap();
        let version_at = out.find("version:").unwrap();
        assert!(metadata_at < project_at && project_at < version_at);
        assert!(out.contains("custom_flag: true"));
        assert!(out.contains("execution_millis: 12"));
    }

    #[test]
    fn test_serialize_is_idempotent() {
        let file = deserialize_file(SAMPLE).unwrap();
        let first = serialize_file(&file).unwrap();
        let second = serialize_file(&deserialize_file(&first).unwrap()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, serialize_file(&file).unwrap());
    }

    #[test]
    fn test_normalize_does_not_touch_input() {
        let file = deserialize_file(SAMPLE).unwrap();
        let normalized = normalize_sorting_keys(&file);
        assert_eq!(file.project.notebooks[0].blocks[0].header().sorting_key, "zz");
        assert_eq!(normalized.project.notebooks[0].blocks[0].header().sorting_key, "000000");
    }
}
