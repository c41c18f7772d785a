//! Chart blocks.

use serde_json::Value;

use crate::escape::{escape_python_string, sanitize_python_variable_name};
use crate::model::{ExecutableBlock, VisualizationFields};

/// Body of a `"""..."""` literal that evaluates back to `text`.
fn triple_quoted_body(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

pub(crate) fn emit(block: &ExecutableBlock<VisualizationFields>) -> String {
    let fields = &block.metadata.fields;
    let (Some(variable), Some(spec)) = (
        fields.deepnote_variable_name.as_deref().filter(|v| !v.is_empty()),
        fields.deepnote_visualization_spec.as_ref(),
    ) else {
        return String::new();
    };

    let filters = fields
        .deepnote_chart_filter
        .as_ref()
        .and_then(|f| f.advanced_filters.clone())
        .unwrap_or_default();

    format!(
        "_dntk.DeepnoteChart({}, \"\"\"{}\"\"\", attach_selection=True, filters={})",
        sanitize_python_variable_name(variable),
        triple_quoted_body(&spec.to_string()),
        escape_python_string(&Value::Array(filters).to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::test_support::executable;
    use crate::model::ChartFilter;
    use serde_json::json;

    #[test]
    fn test_unconfigured_chart_emits_nothing() {
        let block = executable("v", None, VisualizationFields::default());
        assert_eq!(emit(&block), "");

        let only_name = executable(
            "v",
            None,
            VisualizationFields {
                deepnote_variable_name: Some("df".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(emit(&only_name), "");
    }

    #[test]
    fn test_chart_call() {
        let block = executable(
            "v",
            None,
            VisualizationFields {
                deepnote_variable_name: Some("sales df".to_string()),
                deepnote_visualization_spec: Some(json!({"mark": "bar", "title": "a\\b"})),
                deepnote_chart_filter: Some(ChartFilter {
                    advanced_filters: Some(vec![json!({"column": "x"})]),
                    ..Default::default()
                }),
            },
        );
        assert_eq!(
            emit(&block),
            r#"_dntk.DeepnoteChart(sales_df, """{\"mark\":\"bar\",\"title\":\"a\\\\b\"}""", attach_selection=True, filters='[{"column":"x"}]')"#
        );
    }

    #[test]
    fn test_string_spec_cannot_close_the_literal() {
        let block = executable(
            "v",
            None,
            VisualizationFields {
                deepnote_variable_name: Some("df".to_string()),
                deepnote_visualization_spec: Some(json!("\"\"\"); import os; (\"")),
                deepnote_chart_filter: None,
            },
        );
        let out = emit(&block);
        let body = out
            .strip_prefix("_dntk.DeepnoteChart(df, \"\"\"")
            .and_then(|rest| rest.strip_suffix("\"\"\", attach_selection=True, filters='[]')"))
            .unwrap();
        assert!(!body.contains("\"\"\""));
        assert!(body.chars().zip(body.chars().skip(1)).all(|(a, b)| b != '"' || a == '\\'));
    }
}
