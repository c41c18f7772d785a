//! Notebook function blocks: calls into another notebook of the project.

use minijinja::context;
use serde_json::Value;

use super::templates::{renderer, NOTEBOOK_FUNCTION_TEMPLATE};
use super::CodegenError;
use crate::escape::{escape_python_string, python_literal, sanitize_python_variable_name};
use crate::model::{ExecutableBlock, NotebookFunctionFields};

const UNCONFIGURED: &str = "# Notebook function: Not configured\npass";

pub(crate) fn emit(block: &ExecutableBlock<NotebookFunctionFields>) -> Result<String, CodegenError> {
    let fields = &block.metadata.fields;
    let Some(notebook_id) = fields.function_notebook_id.as_deref() else {
        return Ok(UNCONFIGURED.to_string());
    };

    let inputs = Value::Object(fields.function_notebook_inputs.clone().unwrap_or_default());

    // (export name, local name) of enabled exports, sorted by export name.
    let exports: Vec<(&str, String)> = fields
        .function_notebook_export_mappings
        .iter()
        .flatten()
        .filter(|(_, mapping)| mapping.enabled)
        .map(|(export, mapping)| {
            (
                export.as_str(),
                sanitize_python_variable_name(&mapping.variable_name),
            )
        })
        .collect();

    let exports_summary = if exports.is_empty() {
        "(none)".to_string()
    } else {
        exports
            .iter()
            .map(|(export, local)| format!("{} -> {}", export, local))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mappings_literal = format!(
        "{{{}}}",
        exports
            .iter()
            .map(|(export, local)| format!(
                "{}: {}",
                escape_python_string(export),
                escape_python_string(local)
            ))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let targets = exports
        .iter()
        .map(|(_, local)| local.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    renderer().render(
        NOTEBOOK_FUNCTION_TEMPLATE,
        context! {
            notebook_id => notebook_id,
            inputs_json => inputs.to_string(),
            exports_summary => exports_summary,
            targets => targets,
            inputs_literal => python_literal(&inputs),
            mappings_literal => mappings_literal,
        },
    )
}
