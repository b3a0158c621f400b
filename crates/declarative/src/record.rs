//! Resource records: a logical path, its resolved metadata, and optionally
//! its payload.
//!
//! Records are built per operation and discarded afterwards. Everything
//! remote (collection path, remote resource path, operation paths) is
//! derived on demand from the metadata and whatever payload is at hand.

use crate::error::Result;
use crate::headers::{self, HeaderMap};
use crate::metadata::template::Scope;
use crate::metadata::{OperationKind, OperationMetadata, PayloadConfig, ResourceMetadata};
use crate::path;
use crate::payload;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A logical path coupled with its rules and payload.
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub path: String,
    pub metadata: Arc<ResourceMetadata>,
    pub data: Option<Value>,
    collection_override: Option<String>,
}

impl ResourceRecord {
    pub fn new(path: impl Into<String>, metadata: ResourceMetadata) -> Self {
        Self {
            path: path.into(),
            metadata: Arc::new(metadata),
            data: None,
            collection_override: None,
        }
    }

    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    /// Pin the remote collection path, e.g. after ancestor replacement.
    pub fn with_collection_path(mut self, collection: impl Into<String>) -> Self {
        self.collection_override = Some(collection.into());
        self
    }

    pub fn is_collection(&self) -> bool {
        path::is_collection(&self.path)
    }

    /// Remote collection path: pinned value, declared `collectionPath`, or
    /// the logical collection.
    pub fn collection_path(&self) -> String {
        if let Some(pinned) = &self.collection_override {
            return path::normalize(pinned);
        }
        let declared = self
            .metadata
            .resource_info
            .as_ref()
            .map(|info| info.collection_path.trim())
            .filter(|p| !p.is_empty());
        match declared {
            Some(declared) => path::normalize(declared),
            None if self.is_collection() => path::normalize(&self.path),
            None => path::parent(&self.path),
        }
    }

    fn attribute_value(data: Option<&Value>, attr: Option<&str>) -> Option<String> {
        let value = payload::lookup_string(data?, attr?)?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Value of the id attribute in `data`.
    pub fn id_value(&self, data: Option<&Value>) -> Option<String> {
        Self::attribute_value(data, self.metadata.id_attribute())
    }

    /// Value of the alias attribute in `data`.
    pub fn alias_value(&self, data: Option<&Value>) -> Option<String> {
        Self::attribute_value(data, self.metadata.alias_attribute())
    }

    /// Collection path plus the id value, else the alias value, else the
    /// last literal path segment.
    pub fn remote_resource_path(&self, data: Option<&Value>) -> String {
        let segment = self
            .id_value(data)
            .or_else(|| self.alias_value(data))
            .unwrap_or_else(|| path::last_segment(&self.path));
        path::join(&self.collection_path(), &path::sanitize_segment(&segment))
    }

    /// Local path the item would have if it were named by its alias.
    ///
    /// Built from the local parent rather than the remote collection, so the
    /// repository can keep its own layout. Falls back to the record path.
    pub fn alias_path(&self, data: Option<&Value>) -> String {
        let Some(alias) = self
            .alias_value(data)
            .map(|a| path::sanitize_segment(&a))
            .filter(|a| !a.is_empty())
        else {
            return self.path.clone();
        };
        let base = if self.is_collection() {
            path::normalize(&self.path)
        } else {
            path::parent(&self.path)
        };
        path::join(&base, &alias)
    }

    fn declared(&self, kind: OperationKind) -> Option<OperationMetadata> {
        self.metadata.operation(kind).cloned()
    }

    /// List (falling back to get) for collections, get for items.
    pub fn read_operation(&self, is_collection: bool) -> Option<OperationMetadata> {
        if is_collection {
            self.declared(OperationKind::List)
                .or_else(|| self.declared(OperationKind::Get))
        } else {
            self.declared(OperationKind::Get)
        }
    }

    pub fn create_operation(&self) -> Option<OperationMetadata> {
        self.declared(OperationKind::Create)
            .or_else(|| self.declared(OperationKind::Update))
            .or_else(|| self.declared(OperationKind::Get))
    }

    pub fn update_operation(&self) -> Option<OperationMetadata> {
        self.declared(OperationKind::Update)
            .or_else(|| self.declared(OperationKind::Get))
    }

    pub fn delete_operation(&self) -> Option<OperationMetadata> {
        self.declared(OperationKind::Delete)
            .or_else(|| self.declared(OperationKind::Get))
    }

    pub fn read_payload(&self) -> Option<PayloadConfig> {
        self.metadata
            .operation(OperationKind::Get)
            .and_then(|op| op.payload.clone())
    }

    pub fn list_payload(&self) -> Option<PayloadConfig> {
        self.metadata
            .operation(OperationKind::List)
            .and_then(|op| op.payload.clone())
    }

    pub fn apply_payload(&self, value: &Value, config: Option<&PayloadConfig>) -> Result<Value> {
        payload::transform(value, config)
    }

    /// Request-time template context: `path`, `collection`,
    /// `collectionPath`, the identity attribute names and the `id`/`alias`
    /// values from this record's data (falling back to the last segment).
    pub fn template_context(&self, resource_path: &str, is_collection: bool) -> Map<String, Value> {
        let mut ctx = Map::new();
        ctx.insert("path".into(), Value::String(resource_path.to_string()));
        ctx.insert("collection".into(), Value::Bool(is_collection));
        ctx.insert("collectionPath".into(), Value::String(self.collection_path()));
        if let Some(attr) = self.metadata.id_attribute() {
            ctx.insert("idAttribute".into(), Value::String(attr.to_string()));
        }
        if let Some(attr) = self.metadata.alias_attribute() {
            ctx.insert("aliasAttribute".into(), Value::String(attr.to_string()));
        }
        let last = path::last_segment(resource_path);
        let data = self.data.as_ref();
        let id = self.id_value(data).unwrap_or_else(|| last.clone());
        let alias = self.alias_value(data).unwrap_or(last);
        ctx.insert("id".into(), Value::String(id));
        ctx.insert("alias".into(), Value::String(alias));
        ctx
    }

    /// Render an operation's path template into a wire path.
    ///
    /// `.` is the collection path, `./x` is relative to it, absolute paths are
    /// normalized. `None` when the operation declares no template.
    pub fn resolve_operation_path(
        &self,
        resource_path: &str,
        op: Option<&OperationMetadata>,
        is_collection: bool,
    ) -> Option<String> {
        let template = op?.path_template()?;
        let ctx = self.template_context(resource_path, is_collection);
        let rendered = Scope::new(&ctx, resource_path).render(template);
        let rendered = rendered.trim();
        if rendered.is_empty() {
            return None;
        }
        if rendered == "." {
            return Some(self.collection_path());
        }
        if let Some(suffix) = rendered.strip_prefix("./") {
            let base = self.collection_path();
            return Some(path::normalize(&format!(
                "{}/{}",
                base.trim_end_matches('/'),
                suffix
            )));
        }
        if rendered.starts_with('/') {
            return Some(path::normalize(rendered));
        }
        Some(rendered.to_string())
    }

    /// Rendered headers with defaults applied.
    pub fn headers_for(
        &self,
        op: Option<&OperationMetadata>,
        resource_path: &str,
        is_collection: bool,
    ) -> HeaderMap {
        let ctx = self.template_context(resource_path, is_collection);
        let scope = Scope::new(&ctx, resource_path);
        let lines: Vec<String> = op
            .and_then(|op| op.http_headers.as_ref())
            .map(|list| {
                list.iter()
                    .filter_map(|line| headers::split_line(line))
                    .map(|(name, value)| format!("{name}: {}", scope.render(value)))
                    .collect()
            })
            .unwrap_or_default();
        let method = op.map(OperationMetadata::method).unwrap_or_default();
        headers::with_defaults(&lines, &method)
    }

    /// Query parameters from `key=value` entries.
    pub fn query_for(&self, op: Option<&OperationMetadata>) -> BTreeMap<String, Vec<String>> {
        let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let entries = op
            .and_then(|op| op.url.as_ref())
            .and_then(|url| url.query_strings.as_ref());
        for entry in entries.into_iter().flatten() {
            let (key, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            query
                .entry(key.to_string())
                .or_default()
                .push(value.trim().to_string());
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::defaults;
    use crate::metadata::merge::merge;
    use serde_json::json;

    fn record(path: &str, overlay: Value) -> ResourceRecord {
        let overlay: ResourceMetadata = serde_json::from_value(overlay).unwrap();
        ResourceRecord::new(path, merge(defaults::builtin(path), &overlay))
    }

    #[test]
    fn test_remote_path_uses_id_attribute() {
        let rec = record(
            "/users/alice",
            json!({"resourceInfo": {"idFromAttribute": "uuid", "collectionPath": "/api/v1/users"}}),
        );
        let data = json!({"uuid": "u-42", "name": "alice"});
        assert_eq!(rec.remote_resource_path(Some(&data)), "/api/v1/users/u-42");
    }

    #[test]
    fn test_remote_path_falls_back_to_alias_then_segment() {
        let rec = record(
            "/users/alice",
            json!({"resourceInfo": {"idFromAttribute": "uuid", "aliasFromAttribute": "name"}}),
        );
        assert_eq!(
            rec.remote_resource_path(Some(&json!({"name": "al/ice"}))),
            "/users/al-ice"
        );
        assert_eq!(rec.remote_resource_path(None), "/users/alice");
        assert_eq!(rec.remote_resource_path(Some(&json!({"uuid": ""}))), "/users/alice");
    }

    #[test]
    fn test_collection_path_sources() {
        let rec = record("/users/alice", json!({}));
        assert_eq!(rec.collection_path(), "/users");
        let pinned = rec.clone().with_collection_path("/api/users/");
        assert_eq!(pinned.collection_path(), "/api/users");
        let collection = ResourceRecord::new("/users/", ResourceMetadata::default());
        assert_eq!(collection.collection_path(), "/users");
    }

    #[test]
    fn test_alias_path_uses_local_parent() {
        let rec = record(
            "/realms/master/clients/7f3a",
            json!({"resourceInfo": {
                "aliasFromAttribute": "clientId",
                "collectionPath": "/admin/realms/master/clients"
            }}),
        );
        let item = json!({"id": "7f3a", "clientId": "web"});
        assert_eq!(rec.alias_path(Some(&item)), "/realms/master/clients/web");
        assert_eq!(rec.alias_path(None), "/realms/master/clients/7f3a");

        let collection = record("/realms/master/clients/", json!({"resourceInfo": {"aliasFromAttribute": "clientId"}}));
        assert_eq!(collection.alias_path(Some(&item)), "/realms/master/clients/web");
    }

    #[test]
    fn test_operation_fallbacks() {
        let rec = ResourceRecord::new(
            "/a/b",
            serde_json::from_value(json!({"operationInfo": {
                "getResource": {"httpMethod": "GET"},
                "updateResource": {"httpMethod": "PATCH"}
            }}))
            .unwrap(),
        );
        assert_eq!(rec.create_operation().unwrap().http_method, "PATCH");
        assert_eq!(rec.update_operation().unwrap().http_method, "PATCH");
        assert_eq!(rec.delete_operation().unwrap().http_method, "GET");
        assert_eq!(rec.read_operation(true).unwrap().http_method, "GET");

        let empty = ResourceRecord::new("/a/b", ResourceMetadata::default());
        assert!(empty.read_operation(false).is_none());
        assert!(empty.create_operation().is_none());
    }

    #[test]
    fn test_resolve_operation_path_forms() {
        let rec = record(
            "/users/alice",
            json!({"resourceInfo": {"collectionPath": "/api/users"}}),
        )
        .with_data(Some(json!({"id": "42"})));
        let op = |p: &str| OperationMetadata {
            url: Some(crate::metadata::UrlMetadata {
                path: p.to_string(),
                query_strings: None,
            }),
            ..Default::default()
        };
        assert_eq!(
            rec.resolve_operation_path("/users/alice", Some(&op(".")), false),
            Some("/api/users".to_string())
        );
        assert_eq!(
            rec.resolve_operation_path("/users/alice", Some(&op("./{{.id}}/profile")), false),
            Some("/api/users/42/profile".to_string())
        );
        assert_eq!(
            rec.resolve_operation_path("/users/alice", Some(&op("//v2//{{.alias}}")), false),
            Some("/v2/42".to_string())
        );
        assert_eq!(
            rec.resolve_operation_path("/users/alice", Some(&OperationMetadata::default()), false),
            None
        );
    }

    #[test]
    fn test_headers_for_renders_and_defaults() {
        let rec = record(
            "/users/alice",
            json!({"operationInfo": {"updateResource": {
                "httpMethod": "PUT",
                "httpHeaders": ["If-Match: {{.id}}", "x-trace: on"]
            }}}),
        )
        .with_data(Some(json!({"id": "42"})));
        let op = rec.update_operation();
        let headers = rec.headers_for(op.as_ref(), "/users/alice", false);
        assert_eq!(headers["If-Match"], vec!["42"]);
        assert_eq!(headers["X-Trace"], vec!["on"]);
        assert_eq!(headers["Accept"], vec!["application/json"]);
        assert_eq!(headers["Content-Type"], vec!["application/json"]);
    }

    #[test]
    fn test_query_for() {
        let rec = record(
            "/users/",
            json!({"operationInfo": {"listCollection": {"url": {
                "queryStrings": ["max=100", "flag", "tag=a", "tag=b", "=x"]
            }}}}),
        );
        let query = rec.query_for(rec.read_operation(true).as_ref());
        assert_eq!(query["max"], vec!["100"]);
        assert_eq!(query["flag"], vec![""]);
        assert_eq!(query["tag"], vec!["a", "b"]);
        assert_eq!(query.len(), 3);
    }

    #[test]
    fn test_apply_read_payload() {
        let rec = record(
            "/users/alice",
            json!({"operationInfo": {"getResource": {"payload": {"suppressAttributes": ["createdAt"]}}}}),
        );
        let out = rec
            .apply_payload(&json!({"id": 1, "createdAt": "x"}), rec.read_payload().as_ref())
            .unwrap();
        assert_eq!(out, json!({"id": 1}));
    }
}
