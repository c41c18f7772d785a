//! Block union validation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use super::reader::{expected, join, string_items, FieldReader, Issues};
use crate::model::*;

static CONTENT_HASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z0-9]+:)?[a-f0-9]+$").expect("valid content hash regex"));

static EMPTY_METADATA: Lazy<Value> = Lazy::new(|| Value::Object(Map::new()));

/// Validate one block at `path`.
pub(crate) fn read_block(path: &str, value: &Value, issues: &mut Issues) -> Option<Block> {
    let mut r = FieldReader::object(path, value, issues)?;

    let block_type = match r.get("type").and_then(Value::as_str) {
        Some(name) => name.parse::<BlockType>().ok(),
        None => None,
    };
    let Some(block_type) = block_type else {
        let names: Vec<String> = BlockType::ALL
            .iter()
            .map(|t| format!("'{}'", t.as_str()))
            .collect();
        issues.push(
            &r.field_path("type"),
            format!(
                "Invalid discriminator value. Expected {}",
                names.join(" | ")
            ),
        );
        return None;
    };

    let header = read_header(&mut r, issues);
    let content = r.opt_str("content", issues);

    let block = match block_type {
        BlockType::Markdown => {
            Block::Markdown(presentation(&mut r, header, content, issues, no_fields)?)
        }
        BlockType::Image => {
            Block::Image(presentation(&mut r, header, content, issues, image_fields)?)
        }
        BlockType::Separator => {
            Block::Separator(presentation(&mut r, header, content, issues, no_fields)?)
        }
        BlockType::Heading1 => {
            Block::Heading1(presentation(&mut r, header, content, issues, no_fields)?)
        }
        BlockType::Heading2 => {
            Block::Heading2(presentation(&mut r, header, content, issues, no_fields)?)
        }
        BlockType::Heading3 => {
            Block::Heading3(presentation(&mut r, header, content, issues, no_fields)?)
        }
        BlockType::Paragraph => {
            Block::Paragraph(presentation(&mut r, header, content, issues, no_fields)?)
        }
        BlockType::Bullet => {
            Block::Bullet(presentation(&mut r, header, content, issues, no_fields)?)
        }
        BlockType::Todo => Block::Todo(presentation(&mut r, header, content, issues, todo_fields)?),
        BlockType::Callout => {
            Block::Callout(presentation(&mut r, header, content, issues, callout_fields)?)
        }
        BlockType::Code => Block::Code(executable(&mut r, header, content, issues, code_fields)?),
        BlockType::Sql => Block::Sql(executable(&mut r, header, content, issues, sql_fields)?),
        BlockType::NotebookFunction => {
            Block::NotebookFunction(executable(&mut r, header, content, issues, notebook_function_fields)?)
        }
        BlockType::Visualization => {
            Block::Visualization(executable(&mut r, header, content, issues, visualization_fields)?)
        }
        BlockType::Button => {
            Block::Button(executable(&mut r, header, content, issues, button_fields)?)
        }
        BlockType::BigNumber => {
            Block::BigNumber(executable(&mut r, header, content, issues, big_number_fields)?)
        }
        BlockType::InputText => {
            Block::InputText(executable(&mut r, header, content, issues, text_input_fields)?)
        }
        BlockType::InputTextarea => {
            Block::InputTextarea(executable(&mut r, header, content, issues, text_input_fields)?)
        }
        BlockType::InputCheckbox => {
            Block::InputCheckbox(executable(&mut r, header, content, issues, checkbox_input_fields)?)
        }
        BlockType::InputSelect => {
            Block::InputSelect(executable(&mut r, header, content, issues, select_input_fields)?)
        }
        BlockType::InputSlider => {
            Block::InputSlider(executable(&mut r, header, content, issues, slider_input_fields)?)
        }
        BlockType::InputDate => {
            Block::InputDate(executable(&mut r, header, content, issues, date_input_fields)?)
        }
        BlockType::InputDateRange => {
            Block::InputDateRange(executable(&mut r, header, content, issues, date_range_input_fields)?)
        }
        BlockType::InputFile => {
            Block::InputFile(executable(&mut r, header, content, issues, file_input_fields)?)
        }
    };

    r.drop_rest();
    Some(block)
}

fn read_header(r: &mut FieldReader, issues: &mut Issues) -> Option<BlockHeader> {
    let id = r.required_str("id", issues);
    let block_group = r.required_str("blockGroup", issues);
    let sorting_key = r.required_str("sortingKey", issues);
    let content_hash = r.opt_str("contentHash", issues).filter(|hash| {
        let ok = CONTENT_HASH.is_match(hash);
        if !ok {
            issues.push(&r.field_path("contentHash"), "Invalid");
        }
        ok
    });
    let version = r.opt_u64("version", issues);

    Some(BlockHeader {
        id: id?,
        block_group: block_group?,
        sorting_key: sorting_key?,
        content_hash,
        version,
    })
}

type FieldsFn<F> = fn(&mut FieldReader, &mut Issues) -> F;

/// Metadata reader, with an absent `metadata` read as `{}`.
fn metadata_reader<'a>(r: &mut FieldReader<'a>, issues: &mut Issues) -> Option<FieldReader<'a>> {
    let empty: &'static Value = &EMPTY_METADATA;
    let value = r.get("metadata").unwrap_or(empty);
    FieldReader::object(&r.field_path("metadata"), value, issues)
}

fn presentation<F>(
    r: &mut FieldReader,
    header: Option<BlockHeader>,
    content: Option<String>,
    issues: &mut Issues,
    read_fields: FieldsFn<F>,
) -> Option<PresentationBlock<F>> {
    let mut m = metadata_reader(r, issues)?;
    let base = read_base(&mut m, issues);
    let fields = read_fields(&mut m, issues);
    let metadata = PresentationMetadata {
        base,
        fields,
        extra: m.rest(),
    };

    Some(PresentationBlock {
        header: header?,
        content,
        metadata,
    })
}

fn executable<F>(
    r: &mut FieldReader,
    header: Option<BlockHeader>,
    content: Option<String>,
    issues: &mut Issues,
    read_fields: FieldsFn<F>,
) -> Option<ExecutableBlock<F>> {
    let mut m = metadata_reader(r, issues)?;
    let base = read_base(&mut m, issues);
    let execution_metadata = read_execution_metadata(&mut m, issues);
    let fields = read_fields(&mut m, issues);
    let metadata = ExecutableMetadata {
        base,
        execution: execution_metadata,
        fields,
        extra: m.rest(),
    };

    let execution = ExecutionState {
        execution_count: r.opt_i64("executionCount", issues),
        execution_started_at: r.opt_datetime("executionStartedAt", issues),
        execution_finished_at: r.opt_datetime("executionFinishedAt", issues),
        outputs: r.opt_array("outputs", issues),
    };

    Some(ExecutableBlock {
        header: header?,
        content,
        metadata,
        execution,
    })
}

// ============================================================================
// Metadata layers
// ============================================================================

fn read_base(m: &mut FieldReader, issues: &mut Issues) -> BaseMetadata {
    BaseMetadata {
        deepnote_app_is_code_hidden: m.opt_bool("deepnote_app_is_code_hidden", issues),
        deepnote_app_is_output_hidden: m.opt_bool("deepnote_app_is_output_hidden", issues),
        deepnote_app_block_visible: m.opt_bool("deepnote_app_block_visible", issues),
        deepnote_app_block_order: m.opt_number("deepnote_app_block_order", issues),
        deepnote_app_block_group_id: m.opt_str("deepnote_app_block_group_id", issues),
        deepnote_app_block_subgroup_id: m.opt_str("deepnote_app_block_subgroup_id", issues),
        deepnote_app_block_width: m.opt_number("deepnote_app_block_width", issues),
    }
}

fn read_execution_metadata(m: &mut FieldReader, issues: &mut Issues) -> ExecutionMetadata {
    let allow_embed = m.get("allow_embed").and_then(|v| match v {
        Value::Bool(_) | Value::String(_) => Some(v.clone()),
        other => {
            issues.push(&m.field_path("allow_embed"), expected("boolean | string", other));
            None
        }
    });

    ExecutionMetadata {
        is_code_hidden: m.opt_bool("is_code_hidden", issues),
        is_output_hidden: m.opt_bool("is_output_hidden", issues),
        allow_embed,
        execution_start: m.opt_number("execution_start", issues),
        execution_millis: m.opt_number("execution_millis", issues),
        execution_context_id: m.opt_str("execution_context_id", issues),
        source_hash: m.opt_str("source_hash", issues),
        deepnote_to_be_reexecuted: m.opt_bool("deepnote_to_be_reexecuted", issues),
        deepnote_cell_height: m.opt_number("deepnote_cell_height", issues),
        deepnote_output_height_limit_disabled: m
            .opt_bool("deepnote_output_height_limit_disabled", issues),
        deepnote_table_state: m.opt_map("deepnote_table_state", issues),
        deepnote_table_loading: m.opt_bool("deepnote_table_loading", issues),
        deepnote_table_invalid: m.opt_bool("deepnote_table_invalid", issues),
    }
}

// ============================================================================
// Presentation
// ============================================================================

fn no_fields(_: &mut FieldReader, _: &mut Issues) -> NoFields {
    NoFields {}
}

fn image_fields(m: &mut FieldReader, issues: &mut Issues) -> ImageFields {
    ImageFields {
        deepnote_img_src: m.opt_str("deepnote_img_src", issues),
        deepnote_img_width: m.opt_str("deepnote_img_width", issues),
        deepnote_img_alignment: m.opt_str("deepnote_img_alignment", issues),
    }
}

fn todo_fields(m: &mut FieldReader, issues: &mut Issues) -> TodoFields {
    TodoFields {
        checked: m.opt_bool("checked", issues),
    }
}

fn callout_fields(m: &mut FieldReader, issues: &mut Issues) -> CalloutFields {
    CalloutFields {
        color: m.opt_str("color", issues),
    }
}

// ============================================================================
// Computation
// ============================================================================

fn code_fields(m: &mut FieldReader, issues: &mut Issues) -> CodeFields {
    CodeFields {
        function_export_name: m.opt_str("function_export_name", issues),
    }
}

fn sql_fields(m: &mut FieldReader, issues: &mut Issues) -> SqlFields {
    SqlFields {
        deepnote_variable_name: m.opt_str("deepnote_variable_name", issues),
        deepnote_return_variable_type: m.opt_enum(
            "deepnote_return_variable_type",
            &[
                ("dataframe", ReturnVariableType::Dataframe),
                ("query_preview", ReturnVariableType::QueryPreview),
            ],
            issues,
        ),
        sql_integration_id: m.opt_str("sql_integration_id", issues),
        is_compiled_sql_query_visible: m.opt_bool("is_compiled_sql_query_visible", issues),
        function_export_name: m.opt_str("function_export_name", issues),
    }
}

fn notebook_function_fields(m: &mut FieldReader, issues: &mut Issues) -> NotebookFunctionFields {
    let function_notebook_id = m.opt_str("function_notebook_id", issues);
    let function_notebook_inputs = m.opt_map("function_notebook_inputs", issues);

    let mappings_path = m.field_path("function_notebook_export_mappings");
    let function_notebook_export_mappings = m
        .opt_map("function_notebook_export_mappings", issues)
        .map(|raw| {
            let mut out = BTreeMap::new();
            for (name, value) in &raw {
                let path = join(&mappings_path, name);
                let Some(mut r) = FieldReader::object(&path, value, issues) else {
                    continue;
                };
                let enabled = r.opt_bool("enabled", issues).unwrap_or(false);
                let variable_name = r.required_str("variable_name", issues);
                let extra = r.rest();
                if let Some(variable_name) = variable_name {
                    out.insert(
                        name.clone(),
                        ExportMapping {
                            enabled,
                            variable_name,
                            extra,
                        },
                    );
                }
            }
            out
        });

    NotebookFunctionFields {
        function_notebook_id,
        function_notebook_inputs,
        function_notebook_export_mappings,
    }
}

fn visualization_fields(m: &mut FieldReader, issues: &mut Issues) -> VisualizationFields {
    let deepnote_variable_name = m.opt_str("deepnote_variable_name", issues);
    let deepnote_visualization_spec = m.get("deepnote_visualization_spec").cloned();
    let deepnote_chart_filter = m.opt_object("deepnote_chart_filter", issues).map(|mut f| {
        let advanced_filters = f.opt_array("advancedFilters", issues);
        ChartFilter {
            advanced_filters,
            extra: f.rest(),
        }
    });

    VisualizationFields {
        deepnote_variable_name,
        deepnote_visualization_spec,
        deepnote_chart_filter,
    }
}

fn button_fields(m: &mut FieldReader, issues: &mut Issues) -> ButtonFields {
    ButtonFields {
        deepnote_button_title: m.opt_str("deepnote_button_title", issues),
        deepnote_button_color_scheme: m.opt_str("deepnote_button_color_scheme", issues),
        deepnote_button_behavior: m.opt_enum(
            "deepnote_button_behavior",
            &[
                ("run", ButtonBehavior::Run),
                ("set_variable", ButtonBehavior::SetVariable),
            ],
            issues,
        ),
        deepnote_variable_name: m.opt_str("deepnote_variable_name", issues),
    }
}

fn big_number_fields(m: &mut FieldReader, issues: &mut Issues) -> BigNumberFields {
    BigNumberFields {
        deepnote_big_number_title: m.opt_str("deepnote_big_number_title", issues),
        deepnote_big_number_value: m.opt_str("deepnote_big_number_value", issues),
        deepnote_big_number_format: m.opt_str("deepnote_big_number_format", issues),
        deepnote_big_number_comparison_enabled: m
            .opt_bool("deepnote_big_number_comparison_enabled", issues),
        deepnote_big_number_comparison_title: m
            .opt_str("deepnote_big_number_comparison_title", issues),
        deepnote_big_number_comparison_value: m
            .opt_str("deepnote_big_number_comparison_value", issues),
        deepnote_big_number_comparison_type: m.opt_str("deepnote_big_number_comparison_type", issues),
        deepnote_big_number_comparison_format: m
            .opt_str("deepnote_big_number_comparison_format", issues),
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Older documents predate `deepnote_variable_name`; once present it must be a string.
fn variable_name(m: &mut FieldReader, issues: &mut Issues) -> String {
    m.present_str("deepnote_variable_name", issues)
        .unwrap_or_else(|| DEFAULT_INPUT_VARIABLE_NAME.to_string())
}

fn text_input_fields(m: &mut FieldReader, issues: &mut Issues) -> TextInputFields {
    TextInputFields {
        deepnote_variable_name: variable_name(m, issues),
        deepnote_input_label: m.opt_str("deepnote_input_label", issues),
        deepnote_variable_value: m
            .opt_str("deepnote_variable_value", issues)
            .unwrap_or_default(),
        deepnote_variable_default_value: m.opt_str("deepnote_variable_default_value", issues),
    }
}

fn checkbox_input_fields(m: &mut FieldReader, issues: &mut Issues) -> CheckboxInputFields {
    CheckboxInputFields {
        deepnote_variable_name: variable_name(m, issues),
        deepnote_input_label: m.opt_str("deepnote_input_label", issues),
        deepnote_variable_value: m
            .opt_bool("deepnote_variable_value", issues)
            .unwrap_or(false),
        deepnote_input_checkbox_label: m.opt_str("deepnote_input_checkbox_label", issues),
    }
}

fn select_input_fields(m: &mut FieldReader, issues: &mut Issues) -> SelectInputFields {
    let deepnote_variable_name = variable_name(m, issues);
    let deepnote_input_label = m.opt_str("deepnote_input_label", issues);
    let value_path = m.field_path("deepnote_variable_value");
    let deepnote_variable_value = match m.get("deepnote_variable_value") {
        None => SelectValue::Single(String::new()),
        Some(Value::String(s)) => SelectValue::Single(s.clone()),
        Some(Value::Array(items)) => SelectValue::Multiple(string_items(&value_path, items, issues)),
        Some(other) => {
            issues.push(&value_path, expected("string | string[]", other));
            SelectValue::Single(String::new())
        }
    };

    SelectInputFields {
        deepnote_variable_name,
        deepnote_input_label,
        deepnote_variable_value,
        deepnote_variable_options: m
            .opt_str_list("deepnote_variable_options", issues)
            .unwrap_or_default(),
        deepnote_variable_custom_options: m.opt_str_list("deepnote_variable_custom_options", issues),
        deepnote_variable_select_type: m.opt_str("deepnote_variable_select_type", issues),
        deepnote_variable_selected_variable: m
            .opt_str("deepnote_variable_selected_variable", issues),
        deepnote_allow_multiple_values: m.opt_bool("deepnote_allow_multiple_values", issues),
        deepnote_allow_empty_values: m.opt_bool("deepnote_allow_empty_values", issues),
    }
}

fn slider_input_fields(m: &mut FieldReader, issues: &mut Issues) -> SliderInputFields {
    let deepnote_variable_name = variable_name(m, issues);
    let deepnote_input_label = m.opt_str("deepnote_input_label", issues);
    // Numeric values from older producers are kept as their text form.
    let value_path = m.field_path("deepnote_variable_value");
    let deepnote_variable_value = match m.get("deepnote_variable_value") {
        None => "0".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            issues.push(&value_path, expected("string", other));
            "0".to_string()
        }
    };

    SliderInputFields {
        deepnote_variable_name,
        deepnote_input_label,
        deepnote_variable_value,
        deepnote_slider_min_value: m
            .opt_number("deepnote_slider_min_value", issues)
            .unwrap_or_else(|| Number::from(0)),
        deepnote_slider_max_value: m
            .opt_number("deepnote_slider_max_value", issues)
            .unwrap_or_else(|| Number::from(100)),
        deepnote_slider_step: m
            .opt_number("deepnote_slider_step", issues)
            .unwrap_or_else(|| Number::from(1)),
    }
}

fn date_input_fields(m: &mut FieldReader, issues: &mut Issues) -> DateInputFields {
    DateInputFields {
        deepnote_variable_name: variable_name(m, issues),
        deepnote_input_label: m.opt_str("deepnote_input_label", issues),
        deepnote_variable_value: m
            .opt_str("deepnote_variable_value", issues)
            .unwrap_or_default(),
        deepnote_input_date_version: m.opt_i64("deepnote_input_date_version", issues),
    }
}

fn date_range_input_fields(m: &mut FieldReader, issues: &mut Issues) -> DateRangeInputFields {
    let deepnote_variable_name = variable_name(m, issues);
    let deepnote_input_label = m.opt_str("deepnote_input_label", issues);
    let value_path = m.field_path("deepnote_variable_value");
    let deepnote_variable_value = match m.get("deepnote_variable_value") {
        None => DateRangeValue::Named(String::new()),
        Some(Value::String(s)) => DateRangeValue::Named(s.clone()),
        Some(Value::Array(items)) => match items.as_slice() {
            [Value::String(start), Value::String(end)] => {
                DateRangeValue::Absolute(start.clone(), end.clone())
            }
            _ => {
                issues.push(&value_path, "Expected a [start, end] pair of strings");
                DateRangeValue::Named(String::new())
            }
        },
        Some(other) => {
            issues.push(&value_path, expected("string | [string, string]", other));
            DateRangeValue::Named(String::new())
        }
    };

    DateRangeInputFields {
        deepnote_variable_name,
        deepnote_input_label,
        deepnote_variable_value,
    }
}

fn file_input_fields(m: &mut FieldReader, issues: &mut Issues) -> FileInputFields {
    FileInputFields {
        deepnote_variable_name: variable_name(m, issues),
        deepnote_input_label: m.opt_str("deepnote_input_label", issues),
        deepnote_variable_value: m
            .opt_str("deepnote_variable_value", issues)
            .unwrap_or_default(),
        deepnote_allowed_file_extensions: m.opt_str("deepnote_allowed_file_extensions", issues),
    }
}
