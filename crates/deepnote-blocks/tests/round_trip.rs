//! Ingestion rejections and serializer round trips.

use deepnote_blocks::document::{DocumentError, ProhibitedFeature};
use deepnote_blocks::model::{BlockType, ExecutionMode};
use deepnote_blocks::{
    decode_strict, deserialize_file, deserialize_snapshot, parse, serialize_file,
    serialize_snapshot, DeepnoteError,
};

const PROJECT: &str = r#"version: 1.0.0
metadata:
  createdAt: '2024-02-10T09:15:00.000Z'
  modifiedAt: '2024-02-11T10:00:00Z'
project:
  id: 6c1f
  name: Quarterly *review* & notes
  notebooks:
    - id: nb-1
      name: Analysis
      executionMode: downstream
      blocks:
        - id: h1
          type: text-cell-h1
          blockGroup: g1
          sortingKey: b
          content: Revenue
        - id: code
          type: code
          blockGroup: g2
          sortingKey: a
          executionCount: 3
          outputs: []
          content: |
            import pandas as pd
            df = pd.read_csv('sales.csv')
          metadata:
            execution_start: 1714550400000
            ratio: 0.25
            deepnote_table_state: {pageSize: 25}
        - id: slider
          type: input-slider
          blockGroup: g3
          sortingKey: c
          metadata:
            deepnote_variable_name: threshold
            deepnote_variable_value: '7'
            deepnote_slider_step: 0.5
"#;

fn snapshot_text() -> String {
    format!(
        "{}environment:\n  hash: e3b0\n  python:\n    version: '3.11'\nexecution:\n  startedAt: '2024-02-11T10:00:00Z'\n  summary:\n    blocksExecuted: 3\n",
        PROJECT
    )
}

#[test]
fn test_round_trip_is_stable_after_one_pass() {
    let file = deserialize_file(PROJECT).unwrap();
    let once = serialize_file(&file).unwrap();
    let reparsed = deserialize_file(&once).unwrap();
    let twice = serialize_file(&reparsed).unwrap();
    assert_eq!(once, twice);
    assert_eq!(parse(&once).unwrap(), parse(&twice).unwrap());
}

#[test]
fn test_round_trip_preserves_content() {
    let file = deserialize_file(PROJECT).unwrap();
    let reparsed = deserialize_file(&serialize_file(&file).unwrap()).unwrap();

    let notebook = &reparsed.project.notebooks[0];
    assert_eq!(notebook.execution_mode, Some(ExecutionMode::Downstream));
    assert_eq!(
        notebook.block_ids().collect::<Vec<_>>(),
        vec!["h1", "code", "slider"]
    );
    assert_eq!(reparsed.project.name, "Quarterly *review* & notes");
    assert_eq!(reparsed.metadata.modified_at.as_deref(), Some("2024-02-11T10:00:00Z"));

    let code = reparsed.find_block("code").unwrap();
    assert_eq!(code.block_type(), BlockType::Code);
    assert_eq!(
        code.content(),
        "import pandas as pd\ndf = pd.read_csv('sales.csv')\n"
    );
    assert_eq!(
        serde_json::to_value(code).unwrap()["metadata"]["ratio"],
        serde_json::json!(0.25)
    );
    assert_eq!(
        serde_json::to_value(code).unwrap()["metadata"]["execution_start"],
        serde_json::json!(1714550400000u64)
    );
}

#[test]
fn test_serialize_twice_is_byte_identical() {
    let file = deserialize_file(PROJECT).unwrap();
    assert_eq!(serialize_file(&file).unwrap(), serialize_file(&file).unwrap());
}

#[test]
fn test_snapshot_round_trip() {
    let snapshot = deserialize_snapshot(&snapshot_text()).unwrap();
    assert_eq!(snapshot.environment().hash.as_deref(), Some("e3b0"));
    assert_eq!(
        snapshot.execution().summary.as_ref().and_then(|s| s.blocks_executed),
        Some(3)
    );

    let text = serialize_snapshot(&snapshot).unwrap();
    let again = deserialize_snapshot(&text).unwrap();
    assert_eq!(serialize_snapshot(&again).unwrap(), text);
}

#[test]
fn test_snapshot_requires_environment_and_execution() {
    let err = deserialize_snapshot(PROJECT).unwrap_err();
    assert!(matches!(err, DeepnoteError::Snapshot(_)));
    assert_eq!(
        err.to_string(),
        "Invalid snapshot: snapshot requires an 'environment' section"
    );
}

fn prohibited(text: &str) -> ProhibitedFeature {
    match deserialize_file(text) {
        Err(DeepnoteError::Document(DocumentError::ProhibitedFeature { feature, .. })) => feature,
        other => panic!("expected prohibited feature, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_rejects_power_features_in_value_position() {
    assert_eq!(prohibited("base: &base {a: 1}\n"), ProhibitedFeature::Anchor);
    assert_eq!(prohibited("a: 1\nb: *base\n"), ProhibitedFeature::Alias);
    assert_eq!(prohibited("items:\n  - *base\n"), ProhibitedFeature::Alias);
    assert_eq!(prohibited("child:\n  <<: {a: 1}\n"), ProhibitedFeature::MergeKey);
    assert_eq!(prohibited("when: !!timestamp 2024-01-01\n"), ProhibitedFeature::Tag);
    assert_eq!(prohibited("obj: !custom {a: 1}\n"), ProhibitedFeature::Tag);
}

#[test]
fn test_rejection_keeps_the_error_prefix() {
    let err = deserialize_file("a: *x\n").unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Failed to parse Deepnote file: YAML alias is not allowed"));
}

#[test]
fn test_rejects_byte_order_mark() {
    let text = format!("\u{feff}{}", PROJECT);
    let err = deserialize_file(&text).unwrap_err();
    assert!(err.to_string().starts_with("Failed to parse Deepnote file: "));
    assert!(decode_strict(text.as_bytes()).is_err());
}

#[test]
fn test_rejects_nested_duplicate_keys() {
    let text = PROJECT.replace(
        "            deepnote_slider_step: 0.5\n",
        "            deepnote_slider_step: 0.5\n            deepnote_slider_step: 1\n",
    );
    let err = deserialize_file(&text).unwrap_err();
    assert!(matches!(
        err,
        DeepnoteError::Document(DocumentError::Parse(_))
    ));
}

#[test]
fn test_schema_failure_shows_first_issue_only() {
    let text = PROJECT
        .replace("type: text-cell-h1", "type: text-cell-h9")
        .replace("name: Analysis", "name: [Analysis]");
    let err = deserialize_file(&text).unwrap_err();
    let issues = err.validation_issues().unwrap();
    assert_eq!(issues.len(), 2);
    assert_eq!(
        err.to_string(),
        format!("Failed to parse Deepnote file: {}.", issues[0])
    );
}
