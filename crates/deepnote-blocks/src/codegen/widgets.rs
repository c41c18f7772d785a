//! Button and big number blocks.

use minijinja::context;

use super::templates::{renderer, BIG_NUMBER_TEMPLATE};
use super::{CodegenError, EmitContext};
use crate::escape::sanitize_python_variable_name;
use crate::model::{BigNumberFields, ButtonBehavior, ButtonFields, ExecutableBlock};

pub(crate) fn emit_button(block: &ExecutableBlock<ButtonFields>, context: &EmitContext) -> String {
    let fields = &block.metadata.fields;
    match (fields.deepnote_button_behavior, fields.deepnote_variable_name.as_deref()) {
        (Some(ButtonBehavior::SetVariable), Some(variable)) if !variable.is_empty() => {
            let name = sanitize_python_variable_name(variable);
            let active = context.activated_variables.contains(&name);
            format!("{} = {}", name, if active { "True" } else { "False" })
        }
        _ => String::new(),
    }
}

/// `f"{name}"` for a bound variable, `""` otherwise.
fn formatted_value(variable: Option<&str>) -> String {
    match variable.filter(|v| !v.is_empty()) {
        Some(v) => format!("f\"{{{}}}\"", sanitize_python_variable_name(v)),
        None => "\"\"".to_string(),
    }
}

pub(crate) fn emit_big_number(block: &ExecutableBlock<BigNumberFields>) -> Result<String, CodegenError> {
    let fields = &block.metadata.fields;
    let comparison_title = fields
        .deepnote_big_number_comparison_title
        .as_deref()
        .unwrap_or_default();
    let comparison_value = fields
        .deepnote_big_number_comparison_value
        .as_deref()
        .unwrap_or_default();
    let has_comparison = !comparison_title.is_empty() || !comparison_value.is_empty();

    renderer().render(
        BIG_NUMBER_TEMPLATE,
        context! {
            title => fields.deepnote_big_number_title.as_deref().unwrap_or_default(),
            value_expr => formatted_value(fields.deepnote_big_number_value.as_deref()),
            has_comparison => has_comparison,
            comparison_title => comparison_title,
            comparison_value_expr => formatted_value(Some(comparison_value)),
        },
    )
}
