//! Python snippet templates rendered with minijinja.
//!
//! User text only reaches a template through the `pystr` and `pycomment`
//! filters, which route it through the escaping primitives.

use minijinja::{Environment, UndefinedBehavior};
use once_cell::sync::Lazy;
use serde::Serialize;

use super::CodegenError;
use crate::escape::{escape_python_comment, escape_python_string};

const CODE_PRELUDE: &str = r#"if '_dntk' in globals():
  _dntk.dataframe_utils.configure_dataframe_formatter({{ table_state|pystr }})
else:
  _deepnote_current_table_attrs = {{ table_state|pystr }}

{{ content }}
"#;

const SQL_CALL: &str = r#"_dntk.execute_sql(
  {{ query|pystr }},
  {{ env_var|pystr }},
  audit_sql_comment='',
  sql_cache_mode='cache_disabled',
  return_variable_type={{ return_type|pystr }}
)
"#;

const BIG_NUMBER: &str = r#"def __deepnote_big_number__():
    import json
    import jinja2
    from jinja2 import meta

    def render_template(template):
        parsed_content = jinja2.Environment().parse(template)
        required_variables = meta.find_undeclared_variables(parsed_content)
        context = {
            variable_name: globals().get(variable_name)
            for variable_name in required_variables
        }
        result = jinja2.Environment().from_string(template).render(context)
        return result

    rendered_title = render_template({{ title|pystr }})
{% if has_comparison %}
    rendered_comparison_title = render_template({{ comparison_title|pystr }})
{% endif %}

    return json.dumps({
        "title": rendered_title,
        "value": {{ value_expr }},
{% if has_comparison %}
        "comparisonTitle": rendered_comparison_title,
        "comparisonValue": {{ comparison_value_expr }},
{% endif %}
    })

__deepnote_big_number__()
"#;

const NOTEBOOK_FUNCTION: &str = r#"# Notebook function: {{ notebook_id|pycomment }}
# Inputs: {{ inputs_json|pycomment }}
# Exports: {{ exports_summary|pycomment }}
{% if targets %}{{ targets }} = {% endif %}_dntk.run_notebook_function(
    {{ notebook_id|pystr }},
    inputs={{ inputs_literal }},
    export_mappings={{ mappings_literal }},
)
"#;

/// Template names. The `.py` suffix keeps auto-escaping off.
pub(crate) const CODE_PRELUDE_TEMPLATE: &str = "code_prelude.py";
pub(crate) const SQL_CALL_TEMPLATE: &str = "sql_call.py";
pub(crate) const BIG_NUMBER_TEMPLATE: &str = "big_number.py";
pub(crate) const NOTEBOOK_FUNCTION_TEMPLATE: &str = "notebook_function.py";

/// Renderer over the fixed snippet set.
pub(crate) struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        env.add_filter("pystr", |text: String| escape_python_string(&text));
        env.add_filter("pycomment", |text: String| escape_python_comment(&text));

        env.add_template(CODE_PRELUDE_TEMPLATE, CODE_PRELUDE)?;
        env.add_template(SQL_CALL_TEMPLATE, SQL_CALL)?;
        env.add_template(BIG_NUMBER_TEMPLATE, BIG_NUMBER)?;
        env.add_template(NOTEBOOK_FUNCTION_TEMPLATE, NOTEBOOK_FUNCTION)?;

        Ok(Self { env })
    }

    /// Render a named snippet with a serializable context.
    pub(crate) fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, CodegenError> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| CodegenError::Template(format!("{}: {}", name, e)))?;
        template
            .render(context)
            .map_err(|e| CodegenError::Template(format!("{}: {}", name, e)))
    }
}

static RENDERER: Lazy<TemplateRenderer> =
    Lazy::new(|| TemplateRenderer::new().expect("built-in templates parse"));

pub(crate) fn renderer() -> &'static TemplateRenderer {
    &RENDERER
}
