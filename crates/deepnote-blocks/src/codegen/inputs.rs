//! Input blocks: one assignment of the sanitized variable name each.

use once_cell::sync::Lazy;
use regex::Regex;

use super::CodegenError;
use crate::escape::{escape_python_string, sanitize_python_variable_name};
use crate::model::*;

pub(crate) fn emit_text(block: &ExecutableBlock<TextInputFields>) -> String {
    let fields = &block.metadata.fields;
    assign(
        &fields.deepnote_variable_name,
        &escape_python_string(&fields.deepnote_variable_value),
    )
}

pub(crate) fn emit_checkbox(block: &ExecutableBlock<CheckboxInputFields>) -> String {
    let fields = &block.metadata.fields;
    let literal = if fields.deepnote_variable_value { "True" } else { "False" };
    assign(&fields.deepnote_variable_name, literal)
}

pub(crate) fn emit_select(block: &ExecutableBlock<SelectInputFields>) -> String {
    let fields = &block.metadata.fields;
    let allow_multiple = fields.deepnote_allow_multiple_values.unwrap_or(false);

    let literal = match &fields.deepnote_variable_value {
        SelectValue::Multiple(values) => list_literal(values),
        SelectValue::Single(value) if allow_multiple => {
            if value.is_empty() {
                "[]".to_string()
            } else {
                list_literal(std::slice::from_ref(value))
            }
        }
        SelectValue::Single(value) if value.is_empty() => "None".to_string(),
        SelectValue::Single(value) => escape_python_string(value),
    };
    assign(&fields.deepnote_variable_name, &literal)
}

pub(crate) fn emit_slider(block: &ExecutableBlock<SliderInputFields>) -> Result<String, CodegenError> {
    let fields = &block.metadata.fields;
    let literal = numeric_literal(&fields.deepnote_variable_value).ok_or_else(|| {
        CodegenError::InvalidSliderValue {
            variable: fields.deepnote_variable_name.clone(),
            value: fields.deepnote_variable_value.clone(),
        }
    })?;
    Ok(assign(&fields.deepnote_variable_name, &literal))
}

pub(crate) fn emit_date(block: &ExecutableBlock<DateInputFields>) -> String {
    let fields = &block.metadata.fields;
    let name = sanitize_python_variable_name(&fields.deepnote_variable_name);
    let value = &fields.deepnote_variable_value;

    if value.is_empty() {
        return format!("{} = None", name);
    }

    let literal = escape_python_string(value);
    if fields.deepnote_input_date_version == Some(2) {
        format!(
            "from dateutil.parser import parse as _deepnote_parse\n{} = _deepnote_parse({}).date()",
            name, literal
        )
    } else {
        format!(
            "from datetime import datetime as _deepnote_datetime\n{} = _deepnote_datetime.strptime({}, \"%Y-%m-%dT%H:%M:%S.%fZ\")",
            name, literal
        )
    }
}

pub(crate) fn emit_file(block: &ExecutableBlock<FileInputFields>) -> String {
    let fields = &block.metadata.fields;
    let literal = if fields.deepnote_variable_value.is_empty() {
        "None".to_string()
    } else {
        escape_python_string(&fields.deepnote_variable_value)
    };
    assign(&fields.deepnote_variable_name, &literal)
}

fn assign(variable_name: &str, literal: &str) -> String {
    format!("{} = {}", sanitize_python_variable_name(variable_name), literal)
}

fn list_literal(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| escape_python_string(v)).collect();
    format!("[{}]", items.join(", "))
}

/// Python decimal literal: an integer without leading zeros, or a float with
/// a point or an exponent.
static DECIMAL_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:0+|[1-9][0-9]*|(?:[0-9]+\.[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+)$")
        .expect("valid regex")
});

/// The stored text itself when it is a finite decimal literal.
fn numeric_literal(text: &str) -> Option<String> {
    let text = text.trim();
    if !DECIMAL_LITERAL.is_match(text) {
        return None;
    }
    let value: f64 = text.parse().ok()?;
    value.is_finite().then(|| text.to_string())
}
