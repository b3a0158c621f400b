//! Placeholder rendering for metadata templates.
//!
//! Two placeholder forms are understood:
//! - `{{.attr}}` / `{{.a.b}}`: attribute lookup in the template context
//! - `{{../attr}}`: attribute of the resource one level up per `../`
//!
//! Anything that cannot be resolved stays in the output verbatim, so a later
//! rendering pass (request building) can still fill it in.

use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::path;

static PLACEHOLDER: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\{\{\s*(.*?)\s*\}\}").expect("placeholder pattern is valid")
});

/// Resolves the attributes of another resource by logical path.
pub type AttributeLookup<'a> = &'a dyn Fn(&str) -> Option<Value>;

/// Everything a rendering pass can see.
pub struct Scope<'a> {
    context: &'a Map<String, Value>,
    resource_path: &'a str,
    relative: Option<AttributeLookup<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new(context: &'a Map<String, Value>, resource_path: &'a str) -> Self {
        Self {
            context,
            resource_path,
            relative: None,
        }
    }

    /// Enable `{{../attr}}` placeholders.
    pub fn with_relative(mut self, lookup: AttributeLookup<'a>) -> Self {
        self.relative = Some(lookup);
        self
    }

    /// Render every placeholder this scope can resolve.
    pub fn render(&self, raw: &str) -> String {
        if !raw.contains("{{") {
            return raw.to_string();
        }
        PLACEHOLDER
            .replace_all(raw, |caps: &regex::Captures<'_>| {
                self.resolve(&caps[1])
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn resolve(&self, expr: &str) -> Option<String> {
        if expr.starts_with("../") {
            return self.resolve_relative(expr);
        }
        let attr = attribute_reference(expr)?;
        lookup(self.context, attr).and_then(stringify)
    }

    fn resolve_relative(&self, expr: &str) -> Option<String> {
        let lookup_fn = self.relative?;
        let mut rest = expr;
        let mut up = 0;
        while let Some(stripped) = rest.strip_prefix("../") {
            up += 1;
            rest = stripped;
        }
        let attr = rest.trim_start_matches("./").trim_start_matches('.').trim();
        if attr.is_empty() {
            return None;
        }

        let mut segs = path::segments(self.resource_path);
        if path::is_collection(self.resource_path) {
            segs.push(String::new());
        }
        if up > segs.len() || up == segs.len() {
            return None;
        }
        let target = format!("/{}", segs[..segs.len() - up].join("/"));
        let attrs = lookup_fn(&path::normalize(&target))?;
        crate::payload::get_attr(&attrs, attr).and_then(stringify)
    }
}

/// Attribute path referenced by a `.attr` expression. Relative `../attr`
/// expressions read another path's attributes and are not context references.
fn attribute_reference(expr: &str) -> Option<&str> {
    if expr.starts_with("../") {
        return None;
    }
    let attr = expr.strip_prefix('.')?.trim();
    if attr.is_empty() || attr.starts_with(['.', '/']) || attr.contains(char::is_whitespace) {
        return None;
    }
    Some(attr)
}

fn lookup<'v>(context: &'v Map<String, Value>, attr: &str) -> Option<&'v Value> {
    let (head, tail) = match attr.split_once('.') {
        Some((head, tail)) => (head, Some(tail)),
        None => (attr, None),
    };
    let value = context.get(head)?;
    match tail {
        Some(tail) => crate::payload::get_attr(value, tail),
        None => Some(value),
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => serde_json::to_string(other).ok(),
    }
}

/// Whether the string still contains a placeholder.
pub fn has_placeholders(raw: &str) -> bool {
    PLACEHOLDER.is_match(raw)
}

/// Attribute paths referenced by `{{.attr}}` placeholders in `raw`.
pub fn attribute_references(raw: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(raw)
        .filter_map(|caps| attribute_reference(&caps[1]).map(String::from))
        .collect()
}

/// Whether `raw` references context attributes that are not available,
/// ignoring the request-time `id` and `alias` placeholders.
pub fn needs_more_context(raw: &str, context: &Map<String, Value>) -> bool {
    attribute_references(raw)
        .iter()
        .filter(|attr| attr.as_str() != "id" && attr.as_str() != "alias")
        .any(|attr| lookup(context, attr).and_then(stringify).is_none())
}
