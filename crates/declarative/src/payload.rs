//! Attribute access and payload transforms over JSON values.
//!
//! Attribute paths are dotted (`spec.owner.name`) and only traverse objects.

use crate::error::Result;
use crate::jq;
use crate::metadata::PayloadConfig;
use serde_json::{Map, Value};

fn split(path: &str) -> Vec<&str> {
    path.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Look up a dotted attribute path.
pub fn get_attr<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let parts = split(path);
    if parts.is_empty() {
        return None;
    }
    let mut current = value;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Look up a dotted attribute path and render scalars as a string.
///
/// Strings come back verbatim, numbers and booleans in JSON text form.
/// Missing, null and composite values yield `None`.
pub fn lookup_string(value: &Value, path: &str) -> Option<String> {
    match get_attr(value, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Set a dotted attribute path, creating intermediate objects.
pub fn set_attr(obj: &mut Map<String, Value>, path: &str, value: Value) {
    let parts = split(path);
    let Some((last, parents)) = parts.split_last() else {
        return;
    };
    let mut current = obj;
    for part in parents {
        let entry = current
            .entry((*part).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert((*last).to_string(), value);
}

/// Remove a dotted attribute path if present.
pub fn delete_attr(obj: &mut Map<String, Value>, path: &str) {
    let parts = split(path);
    let Some((last, parents)) = parts.split_last() else {
        return;
    };
    let mut current = obj;
    for part in parents {
        match current.get_mut(*part) {
            Some(Value::Object(next)) => current = next,
            _ => return,
        }
    }
    current.remove(*last);
}

/// Keep only the listed attribute paths.
pub fn filter_attributes(obj: &Map<String, Value>, paths: &[String]) -> Map<String, Value> {
    let source = Value::Object(obj.clone());
    let mut result = Map::new();
    for path in paths {
        if let Some(value) = get_attr(&source, path) {
            set_attr(&mut result, path, value.clone());
        }
    }
    result
}

/// Drop the listed attribute paths.
pub fn suppress_attributes(obj: &Map<String, Value>, paths: &[String]) -> Map<String, Value> {
    let mut result = obj.clone();
    for path in paths {
        delete_attr(&mut result, path);
    }
    result
}

/// Apply a payload transform: attribute filter, then suppression, then the
/// jq projection. Non-object payloads skip the attribute steps.
pub fn transform(value: &Value, config: Option<&PayloadConfig>) -> Result<Value> {
    let Some(config) = config else {
        return Ok(value.clone());
    };

    let mut current = value.clone();
    if !config.filter_attributes.is_empty() {
        if let Value::Object(obj) = &current {
            current = Value::Object(filter_attributes(obj, &config.filter_attributes));
        }
    }
    if !config.suppress_attributes.is_empty() {
        if let Value::Object(obj) = &current {
            current = Value::Object(suppress_attributes(obj, &config.suppress_attributes));
        }
    }

    let expression = config.jq_expression.trim();
    if expression.is_empty() {
        return Ok(current);
    }
    jq::project(expression, current)
}
