//! Escaping and sanitization primitives.
//!
//! [`escape_python_string`] is the only way user text reaches generated
//! Python source as a literal. Emitters never splice raw block text into code.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::model::DEFAULT_INPUT_VARIABLE_NAME;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static NON_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9a-zA-Z_]").expect("valid regex"));
static BAD_IDENTIFIER_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^a-zA-Z_]+").expect("valid regex"));
static MARKDOWN_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\\`*_{}\[\]()#+\-.!|>])").expect("valid regex"));

/// Single-quoted Python string literal that evaluates back to `text`.
///
/// Backslashes are escaped before quotes so an inserted `\'` is never
/// itself re-escaped.
pub fn escape_python_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\x00"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Map arbitrary text to a bare Python identifier. Never fails.
pub fn sanitize_python_variable_name(name: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(name, "_");
    let stripped = NON_IDENTIFIER.replace_all(&collapsed, "");
    let sanitized = BAD_IDENTIFIER_START.replace(&stripped, "");
    if sanitized.is_empty() {
        DEFAULT_INPUT_VARIABLE_NAME.to_string()
    } else {
        sanitized.into_owned()
    }
}

/// Backslash-escape markdown control characters.
pub fn escape_markdown(text: &str) -> String {
    MARKDOWN_SPECIAL.replace_all(text, r"\$1").into_owned()
}

/// Escape text for a double- or single-quoted HTML attribute.
pub fn escape_html_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Image alignment keyword, or empty when not one of the allowed values.
pub fn sanitize_alignment(alignment: &str) -> &'static str {
    match alignment {
        "left" => "left",
        "center" => "center",
        "right" => "right",
        _ => "",
    }
}

/// Keep only the ASCII digits of a width.
pub fn sanitize_width(width: &str) -> String {
    width.chars().filter(char::is_ascii_digit).collect()
}

/// Text for a `#` comment line: cannot end the comment early.
pub fn escape_python_comment(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

/// Render a JSON value as a Python literal.
pub fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => escape_python_string(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", escape_python_string(k), python_literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}
