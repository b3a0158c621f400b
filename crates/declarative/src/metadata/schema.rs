//! Schema-derived metadata defaults.
//!
//! A [`SchemaSource`] exposes a path-template table (OpenAPI `paths`). For a
//! remote path it picks the best matching template and [`defaults_for`] turns
//! the matched collection and item templates into a metadata layer that sits
//! between the built-in defaults and declared fragments.

use super::{
    HeaderList, OperationInfo, OperationKind, OperationMetadata, ResourceInfo, ResourceMetadata,
    UrlMetadata,
};
use crate::error::{Error, Result};
use crate::path;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Content types declared for one method of a path template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaOperation {
    pub request_types: Vec<String>,
    pub response_types: Vec<String>,
}

/// A path template and the methods it supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    pub template: String,
    /// Upper-case method name to content types.
    pub operations: BTreeMap<String, SchemaOperation>,
}

impl PathTemplate {
    fn segments(&self) -> Vec<String> {
        path::segments(&self.template)
    }

    /// Name of the trailing `{param}` segment, if the template ends in one.
    pub fn trailing_parameter(&self) -> Option<String> {
        let last = self.segments().pop()?;
        parameter_name(&last).map(String::from)
    }

    fn static_count(&self) -> usize {
        self.segments()
            .iter()
            .filter(|s| parameter_name(s).is_none())
            .count()
    }

    fn matches(&self, remote: &[String]) -> bool {
        let segs = self.segments();
        segs.len() == remote.len()
            && segs
                .iter()
                .zip(remote)
                .all(|(tpl, actual)| parameter_name(tpl).is_some() || tpl == actual)
    }
}

fn parameter_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Source of path templates for schema-derived defaults.
pub trait SchemaSource: Send + Sync {
    /// Best template matching a concrete remote path.
    fn match_path(&self, remote_path: &str) -> Option<PathTemplate>;

    /// Best template for an item directly below a remote collection path.
    fn match_item_of(&self, collection_path: &str) -> Option<PathTemplate> {
        self.match_path(&path::join(collection_path, "{item}"))
    }
}

/// Path table parsed from an OpenAPI (or Swagger 2) document.
#[derive(Debug, Clone, Default)]
pub struct OpenApiSchema {
    paths: Vec<PathTemplate>,
}

const METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

impl OpenApiSchema {
    /// Load a JSON or YAML document from disk.
    pub fn load(file: &Path) -> Result<Self> {
        let content = fs::read_to_string(file).map_err(|e| Error::io(file, e))?;
        let is_json = file
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let doc: Value =
            serde_json::from_str(content).map_err(|e| Error::Schema(e.to_string()))?;
        Self::from_document(&doc)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let doc: Value =
            serde_yaml::from_str(content).map_err(|e| Error::Schema(e.to_string()))?;
        Self::from_document(&doc)
    }

    /// Build the path table from a parsed document.
    pub fn from_document(doc: &Value) -> Result<Self> {
        let paths = doc
            .get("paths")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Schema("document has no paths object".to_string()))?;
        let root_consumes = string_list(doc.get("consumes"));
        let root_produces = string_list(doc.get("produces"));

        let mut table = Vec::with_capacity(paths.len());
        for (template, item) in paths {
            let mut operations = BTreeMap::new();
            for method in METHODS {
                let Some(op) = item.get(method) else {
                    continue;
                };
                let mut request_types = content_keys(op.pointer("/requestBody/content"));
                if request_types.is_empty() {
                    request_types = string_list(op.get("consumes"));
                }
                if request_types.is_empty() {
                    request_types = root_consumes.clone();
                }

                let mut response_types = Vec::new();
                if let Some(responses) = op.get("responses").and_then(Value::as_object) {
                    for response in responses.values() {
                        for ty in content_keys(response.get("content")) {
                            if !response_types.contains(&ty) {
                                response_types.push(ty);
                            }
                        }
                    }
                }
                if response_types.is_empty() {
                    response_types = string_list(op.get("produces"));
                }
                if response_types.is_empty() {
                    response_types = root_produces.clone();
                }

                operations.insert(
                    method.to_ascii_uppercase(),
                    SchemaOperation {
                        request_types,
                        response_types,
                    },
                );
            }
            table.push(PathTemplate {
                template: template.clone(),
                operations,
            });
        }

        log::debug!("Loaded {} schema path templates", table.len());
        Ok(Self { paths: table })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn content_keys(content: Option<&Value>) -> Vec<String> {
    content
        .and_then(Value::as_object)
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

impl SchemaSource for OpenApiSchema {
    fn match_path(&self, remote_path: &str) -> Option<PathTemplate> {
        let remote = path::segments(remote_path);
        self.paths
            .iter()
            .filter(|candidate| candidate.matches(&remote))
            .min_by(|a, b| {
                b.static_count()
                    .cmp(&a.static_count())
                    .then_with(|| b.segments().len().cmp(&a.segments().len()))
                    .then_with(|| a.template.cmp(&b.template))
            })
            .cloned()
    }
}

/// Prefer `application/json`, then any `+json` type, then the first one.
pub fn pick_content_type(types: &[String]) -> Option<String> {
    types
        .iter()
        .find(|t| t.eq_ignore_ascii_case("application/json"))
        .or_else(|| types.iter().find(|t| t.to_ascii_lowercase().ends_with("+json")))
        .or_else(|| types.first())
        .cloned()
}

fn schema_operation(
    template: &PathTemplate,
    method: &str,
    url_path: Option<&str>,
) -> Option<OperationMetadata> {
    let op = template.operations.get(method)?;
    let mut lines = Vec::new();
    if let Some(accept) = pick_content_type(&op.response_types) {
        lines.push(format!("Accept: {accept}"));
    }
    if crate::headers::method_supports_body(method) {
        if let Some(content_type) = pick_content_type(&op.request_types) {
            lines.push(format!("Content-Type: {content_type}"));
        }
    }
    Some(OperationMetadata {
        url: url_path.map(|p| UrlMetadata {
            path: p.to_string(),
            query_strings: None,
        }),
        http_method: method.to_string(),
        http_headers: (!lines.is_empty()).then_some(HeaderList(lines)),
        ..Default::default()
    })
}

/// Synthesize a defaults layer for a resolved remote path.
///
/// `remote_path` is the remote collection path for collection targets and
/// the computed remote resource path otherwise. Returns `None` when the
/// schema knows neither the collection nor the item template.
pub fn defaults_for(
    schema: &dyn SchemaSource,
    remote_path: &str,
    is_collection: bool,
) -> Option<ResourceMetadata> {
    let (collection, item) = if is_collection {
        (
            schema.match_path(remote_path),
            schema.match_item_of(remote_path),
        )
    } else {
        (
            schema.match_path(&path::parent(remote_path)),
            schema.match_path(remote_path),
        )
    };
    if collection.is_none() && item.is_none() {
        return None;
    }

    let mut info = OperationInfo::default();
    if let Some(collection) = &collection {
        info.list_collection = schema_operation(collection, "GET", None);
        info.create_resource = schema_operation(collection, "POST", None);
    }
    if let Some(item) = &item {
        info.get_resource = schema_operation(item, "GET", None);
        info.delete_resource = schema_operation(item, "DELETE", None);
        info.update_resource = ["PUT", "PATCH", "POST"]
            .iter()
            .find_map(|method| schema_operation(item, method, None));
        if info.create_resource.is_none() {
            info.create_resource = ["PUT", "POST", "PATCH"]
                .iter()
                .find_map(|method| schema_operation(item, method, Some("./{{.id}}")));
        }
    }

    let resource_info = item
        .as_ref()
        .and_then(PathTemplate::trailing_parameter)
        .map(|param| ResourceInfo {
            id_from_attribute: param.clone(),
            alias_from_attribute: param,
            ..Default::default()
        });

    let has_operations = OperationKind::ALL
        .iter()
        .any(|kind| info.slot_mut(*kind).is_some());
    Some(ResourceMetadata {
        resource_info,
        operation_info: has_operations.then_some(info),
    })
}
