//! Block schema and validation.
//!
//! [`validate`] walks a generic tree once, building the typed model and
//! collecting every issue along the way. Declared metadata fields are typed,
//! undeclared metadata keys go to the record's passthrough map, and defaults
//! are filled in per field.

mod blocks;
mod reader;

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::model::*;
use reader::{join, FieldReader, Issues};

/// One field-level problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dot/index joined path, e.g. `project.notebooks.0.blocks.2.type`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "(root)" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

/// A document that does not match the schema.
///
/// `Display` shows the first issue only; [`SchemaValidationError::issues`]
/// returns all of them for diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}.", .issues[0])]
pub struct SchemaValidationError {
    issues: Vec<ValidationIssue>,
}

impl SchemaValidationError {
    fn new(mut issues: Vec<ValidationIssue>) -> Self {
        if issues.is_empty() {
            issues.push(ValidationIssue {
                path: String::new(),
                message: "Invalid input".to_string(),
            });
        }
        SchemaValidationError { issues }
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn first(&self) -> &ValidationIssue {
        &self.issues[0]
    }
}

/// Validate a generic tree into a [`DeepnoteFile`].
pub fn validate(value: &Value) -> Result<DeepnoteFile, SchemaValidationError> {
    let mut issues = Issues::default();
    let file = read_file(value, &mut issues);

    if let Some(file) = &file {
        check_unique_ids(file, &mut issues);
    }

    let issues = issues.into_vec();
    match file {
        Some(file) if issues.is_empty() => Ok(file),
        _ => {
            debug!(count = issues.len(), "Schema validation failed");
            Err(SchemaValidationError::new(issues))
        }
    }
}

fn read_file(value: &Value, issues: &mut Issues) -> Option<DeepnoteFile> {
    let mut r = FieldReader::object("", value, issues)?;

    let metadata = r
        .required_object("metadata", issues)
        .and_then(|m| read_file_metadata(m, issues));
    let environment = r
        .opt_object("environment", issues)
        .map(|e| read_environment(e, issues));
    let execution = r
        .opt_object("execution", issues)
        .map(|e| read_execution(e, issues));
    let project = r
        .required_object("project", issues)
        .and_then(|p| read_project(p, issues));
    let version = r.required_str("version", issues);
    r.drop_rest();

    Some(DeepnoteFile {
        metadata: metadata?,
        environment,
        execution,
        project: project?,
        version: version?,
    })
}

fn read_file_metadata(mut r: FieldReader, issues: &mut Issues) -> Option<FileMetadata> {
    let created_at = r.required_datetime("createdAt", issues);
    let exported_at = r.opt_datetime("exportedAt", issues);
    let modified_at = r.opt_datetime("modifiedAt", issues);
    let checksum = r.opt_str("checksum", issues);
    Some(FileMetadata {
        created_at: created_at?,
        exported_at,
        modified_at,
        checksum,
        extra: r.rest(),
    })
}

fn read_environment(mut r: FieldReader, issues: &mut Issues) -> Environment {
    let custom_image = r.opt_str("customImage", issues);
    let hash = r.opt_str("hash", issues);
    let packages = r.opt_str_map("packages", issues);
    let platform = r.opt_str("platform", issues);
    let python = r.opt_object("python", issues).map(|mut p| PythonEnvironment {
        environment: p.opt_str("environment", issues),
        version: p.opt_str("version", issues),
        extra: p.rest(),
    });
    Environment {
        custom_image,
        hash,
        packages,
        platform,
        python,
        extra: r.rest(),
    }
}

fn read_execution(mut r: FieldReader, issues: &mut Issues) -> Execution {
    let started_at = r.opt_datetime("startedAt", issues);
    let finished_at = r.opt_datetime("finishedAt", issues);
    let triggered_by = r.opt_str("triggeredBy", issues);
    let inputs = r.opt_map("inputs", issues);
    let summary = r.opt_object("summary", issues).map(|mut s| ExecutionSummary {
        blocks_executed: s.opt_u64("blocksExecuted", issues),
        blocks_succeeded: s.opt_u64("blocksSucceeded", issues),
        blocks_failed: s.opt_u64("blocksFailed", issues),
        total_duration_ms: s.opt_number("totalDurationMs", issues),
        extra: s.rest(),
    });
    let error = r.opt_object("error", issues).map(|mut e| ExecutionError {
        name: e.opt_str("name", issues),
        message: e.opt_str("message", issues),
        traceback: e.opt_str_list("traceback", issues),
        extra: e.rest(),
    });
    Execution {
        started_at,
        finished_at,
        triggered_by,
        inputs,
        summary,
        error,
        extra: r.rest(),
    }
}

fn read_project(mut r: FieldReader, issues: &mut Issues) -> Option<Project> {
    let id = r.required_str("id", issues);
    let name = r.required_str("name", issues);
    let notebooks = read_list(&mut r, "notebooks", true, issues, read_notebook);
    let init_notebook_id = r.opt_str("initNotebookId", issues);
    let integrations = read_list(&mut r, "integrations", false, issues, read_integration);
    let settings = r.opt_object("settings", issues).map(|mut s| ProjectSettings {
        requirements: s.opt_str_list("requirements", issues),
        sql_cache_max_age: s.opt_number("sqlCacheMaxAge", issues),
        extra: s.rest(),
    });
    r.drop_rest();

    Some(Project {
        id: id?,
        name: name?,
        notebooks: notebooks?,
        init_notebook_id,
        integrations,
        settings,
    })
}

fn read_notebook(path: &str, value: &Value, issues: &mut Issues) -> Option<Notebook> {
    let mut r = FieldReader::object(path, value, issues)?;
    let id = r.required_str("id", issues);
    let name = r.required_str("name", issues);
    let blocks = read_list(&mut r, "blocks", true, issues, blocks::read_block);
    let execution_mode = r.opt_enum(
        "executionMode",
        &[
            ("block", ExecutionMode::Block),
            ("downstream", ExecutionMode::Downstream),
        ],
        issues,
    );
    let is_module = r.opt_bool("isModule", issues);
    let working_directory = r.opt_str("workingDirectory", issues);
    r.drop_rest();

    Some(Notebook {
        id: id?,
        name: name?,
        blocks: blocks?,
        execution_mode,
        is_module,
        working_directory,
    })
}

fn read_integration(path: &str, value: &Value, issues: &mut Issues) -> Option<Integration> {
    let mut r = FieldReader::object(path, value, issues)?;
    let id = r.required_str("id", issues);
    let name = r.required_str("name", issues);
    let integration_type = r.required_str("type", issues);
    Some(Integration {
        id: id?,
        name: name?,
        integration_type: integration_type?,
        extra: r.rest(),
    })
}

/// Read an array field item by item. Returns `None` when the field is
/// missing (and required), is not an array, or any item failed.
fn read_list<T>(
    r: &mut FieldReader,
    key: &'static str,
    required: bool,
    issues: &mut Issues,
    read_item: fn(&str, &Value, &mut Issues) -> Option<T>,
) -> Option<Vec<T>> {
    let path = r.field_path(key);
    let value = if required {
        r.required(key, issues)?
    } else {
        r.get(key)?
    };
    let Value::Array(items) = value else {
        issues.push(&path, reader::expected("array", value));
        return None;
    };

    let mut out = Vec::with_capacity(items.len());
    let mut failed = false;
    for (i, item) in items.iter().enumerate() {
        match read_item(&join(&path, i), item, issues) {
            Some(v) => out.push(v),
            None => failed = true,
        }
    }
    (!failed).then_some(out)
}

fn check_unique_ids(file: &DeepnoteFile, issues: &mut Issues) {
    let mut notebooks: HashMap<&str, usize> = HashMap::new();
    let mut blocks: HashMap<&str, (usize, usize)> = HashMap::new();

    for (n, notebook) in file.project.notebooks.iter().enumerate() {
        let notebook_path = format!("project.notebooks.{}", n);
        if let Some(first) = notebooks.insert(&notebook.id, n) {
            issues.push(
                &join(&notebook_path, "id"),
                format!(
                    "Duplicate notebook id '{}' (first used at project.notebooks.{})",
                    notebook.id, first
                ),
            );
        }
        for (b, block) in notebook.blocks.iter().enumerate() {
            if let Some((first_notebook, first_block)) = blocks.insert(block.id(), (n, b)) {
                issues.push(
                    &format!("{}.blocks.{}.id", notebook_path, b),
                    format!(
                        "Duplicate block id '{}' (first used at project.notebooks.{}.blocks.{})",
                        block.id(),
                        first_notebook,
                        first_block
                    ),
                );
            }
        }
    }
}
