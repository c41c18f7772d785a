//! Typed field access over a generic mapping with issue collection.
//!
//! Every read records at most one issue at the field's full path and hands
//! back a best-effort value, so a single pass reports every problem in a
//! document instead of stopping at the first one.

use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use tracing::debug;

use super::ValidationIssue;
use crate::model::Passthrough;

/// Issues collected during one validation pass.
#[derive(Debug, Default)]
pub(crate) struct Issues(Vec<ValidationIssue>);

impl Issues {
    pub(crate) fn push(&mut self, path: &str, message: impl Into<String>) {
        self.0.push(ValidationIssue {
            path: path.to_string(),
            message: message.into(),
        });
    }

    pub(crate) fn into_vec(self) -> Vec<ValidationIssue> {
        self.0
    }
}

/// Join a field name or index onto a path.
pub(crate) fn join(path: &str, segment: impl std::fmt::Display) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}

/// Name of a value's type as it appears in issue messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn expected(what: &str, got: &Value) -> String {
    format!("Expected {}, received {}", what, type_name(got))
}

/// Reads declared fields from one mapping and remembers which were taken.
pub(crate) struct FieldReader<'a> {
    path: String,
    map: &'a Map<String, Value>,
    taken: Vec<&'static str>,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(path: impl Into<String>, map: &'a Map<String, Value>) -> Self {
        FieldReader {
            path: path.into(),
            map,
            taken: Vec::new(),
        }
    }

    /// Reader over `value` when it is a mapping; records an issue otherwise.
    pub(crate) fn object(path: &str, value: &'a Value, issues: &mut Issues) -> Option<Self> {
        match value {
            Value::Object(map) => Some(FieldReader::new(path, map)),
            other => {
                issues.push(path, expected("object", other));
                None
            }
        }
    }

    pub(crate) fn field_path(&self, key: &str) -> String {
        join(&self.path, key)
    }

    /// Raw value of `key`, with `null` treated as absent.
    pub(crate) fn get(&mut self, key: &'static str) -> Option<&'a Value> {
        self.taken.push(key);
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// Raw value of `key`, keeping an explicit `null`.
    pub(crate) fn get_raw(&mut self, key: &'static str) -> Option<&'a Value> {
        self.taken.push(key);
        self.map.get(key)
    }

    pub(crate) fn required(&mut self, key: &'static str, issues: &mut Issues) -> Option<&'a Value> {
        let value = self.get(key);
        if value.is_none() {
            issues.push(&self.field_path(key), "Required");
        }
        value
    }

    pub(crate) fn required_str(&mut self, key: &'static str, issues: &mut Issues) -> Option<String> {
        let value = self.required(key, issues)?;
        self.as_str(key, value, issues)
    }

    pub(crate) fn opt_str(&mut self, key: &'static str, issues: &mut Issues) -> Option<String> {
        let value = self.get(key)?;
        self.as_str(key, value, issues)
    }

    /// Optional string that must not be `null` once the key exists.
    pub(crate) fn present_str(&mut self, key: &'static str, issues: &mut Issues) -> Option<String> {
        let value = self.get_raw(key)?;
        self.as_str(key, value, issues)
    }

    fn as_str(&self, key: &str, value: &Value, issues: &mut Issues) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                issues.push(&self.field_path(key), expected("string", other));
                None
            }
        }
    }

    pub(crate) fn opt_bool(&mut self, key: &'static str, issues: &mut Issues) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            other => {
                issues.push(&self.field_path(key), expected("boolean", other));
                None
            }
        }
    }

    pub(crate) fn opt_number(&mut self, key: &'static str, issues: &mut Issues) -> Option<Number> {
        match self.get(key)? {
            Value::Number(n) => Some(n.clone()),
            other => {
                issues.push(&self.field_path(key), expected("number", other));
                None
            }
        }
    }

    pub(crate) fn opt_u64(&mut self, key: &'static str, issues: &mut Issues) -> Option<u64> {
        let n = self.opt_number(key, issues)?;
        let int = n.as_u64();
        if int.is_none() {
            issues.push(&self.field_path(key), "Expected non-negative integer, received number");
        }
        int
    }

    pub(crate) fn opt_i64(&mut self, key: &'static str, issues: &mut Issues) -> Option<i64> {
        let n = self.opt_number(key, issues)?;
        let int = n.as_i64();
        if int.is_none() {
            issues.push(&self.field_path(key), "Expected integer, received float");
        }
        int
    }

    pub(crate) fn opt_array(&mut self, key: &'static str, issues: &mut Issues) -> Option<Vec<Value>> {
        match self.get(key)? {
            Value::Array(items) => Some(items.clone()),
            other => {
                issues.push(&self.field_path(key), expected("array", other));
                None
            }
        }
    }

    pub(crate) fn opt_map(
        &mut self,
        key: &'static str,
        issues: &mut Issues,
    ) -> Option<Map<String, Value>> {
        match self.get(key)? {
            Value::Object(map) => Some(map.clone()),
            other => {
                issues.push(&self.field_path(key), expected("object", other));
                None
            }
        }
    }

    pub(crate) fn opt_str_list(
        &mut self,
        key: &'static str,
        issues: &mut Issues,
    ) -> Option<Vec<String>> {
        let items = self.opt_array(key, issues)?;
        let path = self.field_path(key);
        Some(string_items(&path, &items, issues))
    }

    pub(crate) fn opt_str_map(
        &mut self,
        key: &'static str,
        issues: &mut Issues,
    ) -> Option<BTreeMap<String, String>> {
        let map = self.opt_map(key, issues)?;
        let path = self.field_path(key);
        let mut out = BTreeMap::new();
        for (k, v) in map {
            match v {
                Value::String(s) => {
                    out.insert(k, s);
                }
                other => issues.push(&join(&path, &k), expected("string", &other)),
            }
        }
        Some(out)
    }

    /// Date-time string, validated but kept as text.
    pub(crate) fn opt_datetime(&mut self, key: &'static str, issues: &mut Issues) -> Option<String> {
        let value = self.opt_str(key, issues)?;
        self.check_datetime(key, value, issues)
    }

    pub(crate) fn required_datetime(
        &mut self,
        key: &'static str,
        issues: &mut Issues,
    ) -> Option<String> {
        let value = self.required_str(key, issues)?;
        self.check_datetime(key, value, issues)
    }

    fn check_datetime(&self, key: &str, value: String, issues: &mut Issues) -> Option<String> {
        if chrono::DateTime::parse_from_rfc3339(&value).is_ok() {
            Some(value)
        } else {
            issues.push(&self.field_path(key), "Invalid datetime");
            None
        }
    }

    /// One of a closed set of string values.
    pub(crate) fn opt_enum<T: Copy>(
        &mut self,
        key: &'static str,
        choices: &[(&str, T)],
        issues: &mut Issues,
    ) -> Option<T> {
        let value = self.get(key)?;
        let found = value
            .as_str()
            .and_then(|s| choices.iter().find(|(name, _)| *name == s))
            .map(|(_, v)| *v);
        if found.is_none() {
            let names: Vec<String> = choices.iter().map(|(n, _)| format!("'{}'", n)).collect();
            let received = match value {
                Value::String(s) => format!("'{}'", s),
                other => type_name(other).to_string(),
            };
            issues.push(
                &self.field_path(key),
                format!(
                    "Invalid enum value. Expected {}, received {}",
                    names.join(" | "),
                    received
                ),
            );
        }
        found
    }

    /// Reader over a nested mapping field.
    pub(crate) fn opt_object(
        &mut self,
        key: &'static str,
        issues: &mut Issues,
    ) -> Option<FieldReader<'a>> {
        let value = self.get(key)?;
        FieldReader::object(&self.field_path(key), value, issues)
    }

    pub(crate) fn required_object(
        &mut self,
        key: &'static str,
        issues: &mut Issues,
    ) -> Option<FieldReader<'a>> {
        let value = self.required(key, issues)?;
        FieldReader::object(&self.field_path(key), value, issues)
    }

    /// Every key that no read asked for, preserved verbatim.
    pub(crate) fn rest(self) -> Passthrough {
        self.map
            .iter()
            .filter(|(k, _)| !self.taken.iter().any(|t| *t == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Discard undeclared keys of a record that does not keep them.
    pub(crate) fn drop_rest(self) {
        let path = self.path.clone();
        let rest = self.rest();
        if !rest.is_empty() {
            let keys: Vec<&str> = rest.keys().map(String::as_str).collect();
            debug!(path = %path, keys = ?keys, "Dropping undeclared fields");
        }
    }
}

pub(crate) fn string_items(path: &str, items: &[Value], issues: &mut Issues) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match item {
            Value::String(s) => Some(s.clone()),
            other => {
                issues.push(&join(path, i), expected("string", other));
                None
            }
        })
        .collect()
}
