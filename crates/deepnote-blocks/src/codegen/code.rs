//! Code and SQL blocks.

use minijinja::context;
use once_cell::sync::Lazy;
use regex::Regex;

use super::templates::{renderer, CODE_PRELUDE_TEMPLATE, SQL_CALL_TEMPLATE};
use super::CodegenError;
use crate::escape::sanitize_python_variable_name;
use crate::model::{CodeFields, ExecutableBlock, SqlFields};

/// Connection variable used when a SQL block has no integration.
pub(crate) const FALLBACK_SQL_ENV_VAR: &str = "SQL_ALCHEMY_JSON_ENV_VAR";

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("valid regex"));

pub(crate) fn emit_code(block: &ExecutableBlock<CodeFields>) -> Result<String, CodegenError> {
    let table_state = match &block.metadata.execution.deepnote_table_state {
        Some(state) => serde_json::Value::Object(state.clone()).to_string(),
        None => "{}".to_string(),
    };

    renderer().render(
        CODE_PRELUDE_TEMPLATE,
        context! {
            table_state => table_state,
            content => block.content.as_deref().unwrap_or_default(),
        },
    )
}

/// Environment variable holding the connection settings of an integration.
pub(crate) fn sql_env_var(integration_id: Option<&str>) -> String {
    match integration_id {
        Some(id) if !id.is_empty() => {
            format!("SQL_{}", NON_WORD.replace_all(&id.to_uppercase(), "_"))
        }
        _ => FALLBACK_SQL_ENV_VAR.to_string(),
    }
}

pub(crate) fn emit_sql(block: &ExecutableBlock<SqlFields>) -> Result<String, CodegenError> {
    let fields = &block.metadata.fields;
    let return_type = fields.deepnote_return_variable_type.unwrap_or_default();

    let call = renderer().render(
        SQL_CALL_TEMPLATE,
        context! {
            query => block.content.as_deref().unwrap_or_default(),
            env_var => sql_env_var(fields.sql_integration_id.as_deref()),
            return_type => return_type.as_str(),
        },
    )?;

    match fields.deepnote_variable_name.as_deref() {
        Some(name) if !name.is_empty() => {
            let name = sanitize_python_variable_name(name);
            Ok(format!("{} = {}\n{}", name, call, name))
        }
        _ => Ok(call),
    }
}
