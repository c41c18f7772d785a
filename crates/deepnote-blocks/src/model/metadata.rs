//! Block metadata records.
//!
//! Metadata is layered: [`BaseMetadata`] for every block, [`ExecutionMetadata`]
//! for executable blocks, then a per-variant fields struct. Keys none of the
//! layers declare land in `extra` and are written back verbatim.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;

/// Undeclared keys preserved for forward compatibility.
pub type Passthrough = BTreeMap<String, Value>;

/// Placeholder variable name for input blocks written before the field existed.
pub const DEFAULT_INPUT_VARIABLE_NAME: &str = "input_1";

// ============================================================================
// Layers
// ============================================================================

/// Visibility and app-layout flags shared by all blocks.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaseMetadata {
    pub deepnote_app_is_code_hidden: Option<bool>,
    pub deepnote_app_is_output_hidden: Option<bool>,
    pub deepnote_app_block_visible: Option<bool>,
    pub deepnote_app_block_order: Option<Number>,
    pub deepnote_app_block_group_id: Option<String>,
    pub deepnote_app_block_subgroup_id: Option<String>,
    pub deepnote_app_block_width: Option<Number>,
}

/// Output flags, cached table view and execution bookkeeping.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionMetadata {
    pub is_code_hidden: Option<bool>,
    pub is_output_hidden: Option<bool>,
    /// Either a flag or an embed mode string.
    pub allow_embed: Option<Value>,
    pub execution_start: Option<Number>,
    pub execution_millis: Option<Number>,
    pub execution_context_id: Option<String>,
    pub source_hash: Option<String>,
    pub deepnote_to_be_reexecuted: Option<bool>,
    pub deepnote_cell_height: Option<Number>,
    pub deepnote_output_height_limit_disabled: Option<bool>,
    /// Cached table view state (sorting, filters, page size).
    pub deepnote_table_state: Option<Map<String, Value>>,
    pub deepnote_table_loading: Option<bool>,
    pub deepnote_table_invalid: Option<bool>,
}

/// Metadata of a presentation block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresentationMetadata<F> {
    #[serde(flatten)]
    pub base: BaseMetadata,
    #[serde(flatten)]
    pub fields: F,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// Metadata of an executable block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutableMetadata<F> {
    #[serde(flatten)]
    pub base: BaseMetadata,
    #[serde(flatten)]
    pub execution: ExecutionMetadata,
    #[serde(flatten)]
    pub fields: F,
    #[serde(flatten)]
    pub extra: Passthrough,
}

// ============================================================================
// Presentation fields
// ============================================================================

/// Variants without metadata of their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoFields {}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageFields {
    pub deepnote_img_src: Option<String>,
    pub deepnote_img_width: Option<String>,
    pub deepnote_img_alignment: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TodoFields {
    pub checked: Option<bool>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalloutFields {
    pub color: Option<String>,
}

// ============================================================================
// Computation fields
// ============================================================================

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CodeFields {
    pub function_export_name: Option<String>,
}

/// What a SQL block hands back to its variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnVariableType {
    #[default]
    Dataframe,
    QueryPreview,
}

impl ReturnVariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnVariableType::Dataframe => "dataframe",
            ReturnVariableType::QueryPreview => "query_preview",
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SqlFields {
    pub deepnote_variable_name: Option<String>,
    pub deepnote_return_variable_type: Option<ReturnVariableType>,
    pub sql_integration_id: Option<String>,
    pub is_compiled_sql_query_visible: Option<bool>,
    pub function_export_name: Option<String>,
}

/// One export of a called notebook and the local name it binds to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportMapping {
    pub enabled: bool,
    pub variable_name: String,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// Notebook function fields. A `None` notebook id is the unconfigured state
/// and is written as an explicit `null`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotebookFunctionFields {
    #[serialize_always]
    pub function_notebook_id: Option<String>,
    pub function_notebook_inputs: Option<Map<String, Value>>,
    pub function_notebook_export_mappings: Option<BTreeMap<String, ExportMapping>>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartFilter {
    #[serde(rename = "advancedFilters")]
    pub advanced_filters: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisualizationFields {
    pub deepnote_variable_name: Option<String>,
    pub deepnote_visualization_spec: Option<Value>,
    pub deepnote_chart_filter: Option<ChartFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonBehavior {
    Run,
    SetVariable,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ButtonFields {
    pub deepnote_button_title: Option<String>,
    pub deepnote_button_color_scheme: Option<String>,
    pub deepnote_button_behavior: Option<ButtonBehavior>,
    pub deepnote_variable_name: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BigNumberFields {
    pub deepnote_big_number_title: Option<String>,
    pub deepnote_big_number_value: Option<String>,
    pub deepnote_big_number_format: Option<String>,
    pub deepnote_big_number_comparison_enabled: Option<bool>,
    pub deepnote_big_number_comparison_title: Option<String>,
    pub deepnote_big_number_comparison_value: Option<String>,
    pub deepnote_big_number_comparison_type: Option<String>,
    pub deepnote_big_number_comparison_format: Option<String>,
}

// ============================================================================
// Input fields
// ============================================================================

/// Text and textarea inputs.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextInputFields {
    pub deepnote_variable_name: String,
    pub deepnote_input_label: Option<String>,
    pub deepnote_variable_value: String,
    pub deepnote_variable_default_value: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckboxInputFields {
    pub deepnote_variable_name: String,
    pub deepnote_input_label: Option<String>,
    pub deepnote_variable_value: bool,
    pub deepnote_input_checkbox_label: Option<String>,
}

/// Select value: one option or, for multi-selects, a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SelectValue {
    Single(String),
    Multiple(Vec<String>),
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectInputFields {
    pub deepnote_variable_name: String,
    pub deepnote_input_label: Option<String>,
    pub deepnote_variable_value: SelectValue,
    pub deepnote_variable_options: Vec<String>,
    pub deepnote_variable_custom_options: Option<Vec<String>>,
    pub deepnote_variable_select_type: Option<String>,
    pub deepnote_variable_selected_variable: Option<String>,
    pub deepnote_allow_multiple_values: Option<bool>,
    pub deepnote_allow_empty_values: Option<bool>,
}

/// Slider input. The value is stored as text and checked at generation time.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderInputFields {
    pub deepnote_variable_name: String,
    pub deepnote_input_label: Option<String>,
    pub deepnote_variable_value: String,
    pub deepnote_slider_min_value: Number,
    pub deepnote_slider_max_value: Number,
    pub deepnote_slider_step: Number,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateInputFields {
    pub deepnote_variable_name: String,
    pub deepnote_input_label: Option<String>,
    pub deepnote_variable_value: String,
    /// `2` selects the date-parser code path; anything else the strptime one.
    pub deepnote_input_date_version: Option<i64>,
}

/// Date range value: a relative range name or an explicit `[start, end]` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DateRangeValue {
    Named(String),
    Absolute(String, String),
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangeInputFields {
    pub deepnote_variable_name: String,
    pub deepnote_input_label: Option<String>,
    pub deepnote_variable_value: DateRangeValue,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInputFields {
    pub deepnote_variable_name: String,
    pub deepnote_input_label: Option<String>,
    pub deepnote_variable_value: String,
    pub deepnote_allowed_file_extensions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layers_flatten_in_declared_order() {
        let mut extra = Passthrough::new();
        extra.insert("zz_future_flag".to_string(), json!(true));
        let metadata = ExecutableMetadata {
            base: BaseMetadata {
                deepnote_app_is_code_hidden: Some(true),
                ..Default::default()
            },
            execution: ExecutionMetadata {
                execution_millis: Some(12.into()),
                ..Default::default()
            },
            fields: CodeFields::default(),
            extra,
        };

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            value,
            json!({
                "deepnote_app_is_code_hidden": true,
                "execution_millis": 12,
                "zz_future_flag": true
            })
        );
    }

    #[test]
    fn test_unconfigured_notebook_function_writes_null() {
        let value = serde_json::to_value(NotebookFunctionFields::default()).unwrap();
        assert_eq!(value, json!({"function_notebook_id": null}));
    }

    #[test]
    fn test_date_range_value_shapes() {
        assert_eq!(
            serde_json::to_value(DateRangeValue::Named("past7days".into())).unwrap(),
            json!("past7days")
        );
        assert_eq!(
            serde_json::to_value(DateRangeValue::Absolute(
                "2024-01-01".into(),
                String::new()
            ))
            .unwrap(),
            json!(["2024-01-01", ""])
        );
    }

    #[test]
    fn test_return_variable_type_names() {
        assert_eq!(ReturnVariableType::default().as_str(), "dataframe");
        assert_eq!(
            serde_json::to_value(ReturnVariableType::QueryPreview).unwrap(),
            json!("query_preview")
        );
    }
}
