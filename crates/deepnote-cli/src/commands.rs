//! Command implementations.
//!
//! Everything here returns text for `main` to print, so the output of each
//! command can be tested without a terminal.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use deepnote_blocks::escape::{escape_python_comment, sanitize_python_variable_name};
use deepnote_blocks::model::BlockFamily;
use deepnote_blocks::{
    emit_markup, emit_notebook_source, parse_bytes, serialize_file, validate, DeepnoteError,
    DeepnoteFile, EmitContext, Notebook, ParserConfig, ValidationIssue,
};

/// Result of the `validate` command.
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationReport {
    Valid { notebooks: usize, blocks: usize },
    /// One line per problem: every schema issue, or the single ingestion error.
    Invalid(Vec<String>),
}

pub fn format_issues(issues: &[ValidationIssue]) -> Vec<String> {
    issues.iter().map(ToString::to_string).collect()
}

/// Run every ingestion and schema check and collect all schema issues.
pub fn validate_bytes(bytes: &[u8], config: &ParserConfig) -> ValidationReport {
    let tree = match parse_bytes(bytes, config) {
        Ok(tree) => tree,
        Err(e) => return ValidationReport::Invalid(vec![DeepnoteError::from(e).to_string()]),
    };
    match validate(&tree) {
        Ok(file) => ValidationReport::Valid {
            notebooks: file.project.notebooks.len(),
            blocks: file.blocks().count(),
        },
        Err(e) => ValidationReport::Invalid(format_issues(e.issues())),
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn validate_path(path: &Path, config: &ParserConfig) -> Result<ValidationReport> {
    Ok(validate_bytes(&read_bytes(path)?, config))
}

/// Read, parse and validate a document, failing on the first issue.
pub fn load_file(path: &Path, config: &ParserConfig) -> Result<(String, DeepnoteFile)> {
    let bytes = read_bytes(path)?;
    let tree = parse_bytes(&bytes, config).map_err(DeepnoteError::from)?;
    let file = validate(&tree).map_err(DeepnoteError::from)?;
    // `parse_bytes` already rejected invalid UTF-8.
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok((text, file))
}

/// Canonical text of `file` and whether `original` already matched it.
pub fn format_file(original: &str, file: &DeepnoteFile) -> Result<(String, bool)> {
    let canonical = serialize_file(file)?;
    let unchanged = canonical == original;
    Ok((canonical, unchanged))
}

/// The notebook named by id or name, or every notebook when no selector is given.
pub fn select_notebooks<'a>(
    file: &'a DeepnoteFile,
    selector: Option<&str>,
) -> Result<Vec<&'a Notebook>> {
    match selector {
        Some(wanted) => file
            .find_notebook(wanted)
            .map(|notebook| vec![notebook])
            .ok_or_else(|| anyhow!("Notebook '{}' not found", wanted)),
        None => Ok(file.project.notebooks.iter().collect()),
    }
}

/// Generated source of the selected notebooks, each under a `# <name>` banner.
pub fn compile_file(
    file: &DeepnoteFile,
    selector: Option<&str>,
    activated: &[String],
) -> Result<String> {
    let context = EmitContext::with_activated_variables(
        activated.iter().map(|name| sanitize_python_variable_name(name)),
    );

    let mut sections = Vec::new();
    for notebook in select_notebooks(file, selector)? {
        let source = emit_notebook_source(notebook, &context)
            .with_context(|| format!("Failed to compile notebook '{}'", notebook.name))?;
        info!(notebook = %notebook.id, blocks = notebook.blocks.len(), "Compiled notebook");

        let banner = format!("# {}", escape_python_comment(&notebook.name));
        if source.is_empty() {
            sections.push(banner);
        } else {
            sections.push(format!("{}\n\n{}", banner, source));
        }
    }
    Ok(sections.join("\n\n"))
}

/// Markup of every presentation block in document order.
pub fn markdown_file(file: &DeepnoteFile) -> Result<String> {
    let mut parts = Vec::new();
    for block in file
        .blocks()
        .filter(|b| b.block_type().family() == BlockFamily::Presentation)
    {
        parts.push(emit_markup(block)?);
    }
    Ok(parts.join("\n\n"))
}
