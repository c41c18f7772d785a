//! Python code generation.
//!
//! [`emit_source`] dispatches on the block variant. Every variant has an arm,
//! so a new variant does not compile until it has an emitter. Blocks with no
//! Python effect emit an empty string.

mod code;
mod date_range;
mod inputs;
mod notebook_function;
mod templates;
mod visualization;
mod widgets;

use std::collections::HashSet;
use thiserror::Error;
use tracing::trace;

use crate::model::{Block, Notebook};

pub use date_range::RelativeDateRange;

/// Failures for stored values that cannot be turned into code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error("Invalid numeric value for slider input '{variable}': '{value}'")]
    InvalidSliderValue { variable: String, value: String },

    #[error("Unknown relative date range: '{0}'")]
    UnknownRelativeRange(String),

    #[error("Template error: {0}")]
    Template(String),
}

/// Caller-supplied state consulted by some emitters.
#[derive(Debug, Clone, Default)]
pub struct EmitContext {
    /// Sanitized names of variables set to true by a prior interaction.
    pub activated_variables: HashSet<String>,
}

impl EmitContext {
    pub fn with_activated_variables<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EmitContext {
            activated_variables: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Python source for one block.
pub fn emit_source(block: &Block, context: &EmitContext) -> Result<String, CodegenError> {
    let source = match block {
        Block::Code(b) => code::emit_code(b)?,
        Block::Sql(b) => code::emit_sql(b)?,
        Block::NotebookFunction(b) => notebook_function::emit(b)?,
        Block::Visualization(b) => visualization::emit(b),
        Block::Button(b) => widgets::emit_button(b, context),
        Block::BigNumber(b) => widgets::emit_big_number(b)?,

        Block::InputText(b) | Block::InputTextarea(b) => inputs::emit_text(b),
        Block::InputCheckbox(b) => inputs::emit_checkbox(b),
        Block::InputSelect(b) => inputs::emit_select(b),
        Block::InputSlider(b) => inputs::emit_slider(b)?,
        Block::InputDate(b) => inputs::emit_date(b),
        Block::InputDateRange(b) => date_range::emit(b)?,
        Block::InputFile(b) => inputs::emit_file(b),

        Block::Markdown(_)
        | Block::Image(_)
        | Block::Separator(_)
        | Block::Heading1(_)
        | Block::Heading2(_)
        | Block::Heading3(_)
        | Block::Paragraph(_)
        | Block::Bullet(_)
        | Block::Todo(_)
        | Block::Callout(_) => String::new(),
    };

    trace!(block_id = %block.id(), block_type = %block.block_type(), bytes = source.len(), "Emitted block source");
    Ok(source)
}

/// Python source for a whole notebook: non-empty emissions in block order,
/// separated by a blank line.
pub fn emit_notebook_source(notebook: &Notebook, context: &EmitContext) -> Result<String, CodegenError> {
    let mut parts = Vec::with_capacity(notebook.blocks.len());
    for block in &notebook.blocks {
        let source = emit_source(block, context)?;
        if !source.is_empty() {
            parts.push(source);
        }
    }
    Ok(parts.join("\n\n"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::*;

    pub(crate) fn header(id: &str) -> BlockHeader {
        BlockHeader {
            id: id.to_string(),
            block_group: "group".to_string(),
            sorting_key: "000000".to_string(),
            content_hash: None,
            version: None,
        }
    }

    pub(crate) fn executable<F>(id: &str, content: Option<&str>, fields: F) -> ExecutableBlock<F> {
        ExecutableBlock {
            header: header(id),
            content: content.map(str::to_string),
            metadata: ExecutableMetadata {
                base: BaseMetadata::default(),
                execution: ExecutionMetadata::default(),
                fields,
                extra: Passthrough::new(),
            },
            execution: ExecutionState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::model::*;

    #[test]
    fn test_presentation_blocks_emit_nothing() {
        let block = Block::Heading1(PresentationBlock {
            header: header("h"),
            content: Some("Title".to_string()),
            metadata: PresentationMetadata::default(),
        });
        assert_eq!(emit_source(&block, &EmitContext::default()).unwrap(), "");
    }

    #[test]
    fn test_notebook_source_skips_empty_emissions() {
        let notebook = Notebook {
            id: "n".to_string(),
            name: "Main".to_string(),
            blocks: vec![
                Block::InputText(executable(
                    "a",
                    None,
                    TextInputFields {
                        deepnote_variable_name: "city".to_string(),
                        deepnote_input_label: None,
                        deepnote_variable_value: "Prague".to_string(),
                        deepnote_variable_default_value: None,
                    },
                )),
                Block::Separator(PresentationBlock {
                    header: header("s"),
                    content: None,
                    metadata: PresentationMetadata::default(),
                }),
                Block::InputCheckbox(executable(
                    "b",
                    None,
                    CheckboxInputFields {
                        deepnote_variable_name: "flag".to_string(),
                        deepnote_input_label: None,
                        deepnote_variable_value: true,
                        deepnote_input_checkbox_label: None,
                    },
                )),
            ],
            execution_mode: None,
            is_module: None,
            working_directory: None,
        };

        let source = emit_notebook_source(&notebook, &EmitContext::default()).unwrap();
        assert_eq!(source, "city = 'Prague'\n\nflag = True");
    }

    #[test]
    fn test_emission_is_deterministic() {
        let block = Block::Code(executable("c", Some("x = 1"), CodeFields::default()));
        let ctx = EmitContext::default();
        assert_eq!(emit_source(&block, &ctx).unwrap(), emit_source(&block, &ctx).unwrap());
    }
}
