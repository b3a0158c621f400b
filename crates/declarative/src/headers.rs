//! HTTP header canonicalization and defaults.

use crate::metadata::HeaderList;
use std::collections::BTreeMap;

/// Canonical multi-value header map, keyed by canonical header name.
pub type HeaderMap = BTreeMap<String, Vec<String>>;

/// Whether a request with this method carries a body.
pub fn method_supports_body(method: &str) -> bool {
    matches!(
        method.trim().to_ascii_uppercase().as_str(),
        "POST" | "PUT" | "PATCH" | "DELETE"
    )
}

/// Split a `Name: value` line. Blank names or values are rejected.
pub fn split_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let (name, value) = (name.trim(), value.trim());
    if name.is_empty() || value.is_empty() {
        return None;
    }
    Some((name, value))
}

/// Canonical header key: `content-type` becomes `Content-Type`.
pub fn canonical_key(name: &str) -> String {
    name.trim()
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Default header lines for a method.
pub fn default_lines(method: &str) -> HeaderList {
    let mut lines = vec!["Accept: application/json".to_string()];
    if method_supports_body(method) {
        lines.push("Content-Type: application/json".to_string());
    }
    HeaderList(lines)
}

/// Collect header lines into a canonical map, then add `Accept` and, for
/// body methods, `Content-Type` when absent.
pub fn with_defaults<'a>(lines: impl IntoIterator<Item = &'a String>, method: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    for line in lines {
        if let Some((name, value)) = split_line(line) {
            map.entry(canonical_key(name))
                .or_default()
                .push(value.to_string());
        }
    }
    map.entry("Accept".to_string())
        .or_insert_with(|| vec!["application/json".to_string()]);
    if method_supports_body(method) {
        map.entry("Content-Type".to_string())
            .or_insert_with(|| vec!["application/json".to_string()]);
    }
    map
}
