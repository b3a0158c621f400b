//! Metadata resolution for logical paths.
//!
//! Resolution runs in layers:
//!
//! 1. enumerate fragment keys for the path ([`MetadataResolver::candidates`])
//! 2. merge the fragments that exist over the built-in defaults
//! 3. build a template context from local (and, when needed, remote)
//!    attributes of the path and its ancestors
//! 4. render templates against that context
//! 5. optionally slot schema-derived defaults under the fragments and
//!    render again
//!
//! Remote attribute loads call back into the reconciler through a
//! [`RemoteLoader`]. An in-flight set, tracked per thread, keeps those
//! reentrant loads from recursing into themselves.

use super::merge::{merge, merge_all, strip_identity};
use super::schema::{self, SchemaSource};
use super::template::{self, Scope};
use super::{defaults, OperationKind, ResourceMetadata};
use crate::backend::{LocalResources, MetadataStore};
use crate::error::Result;
use crate::path;
use crate::record::ResourceRecord;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

/// Fetches the remote payload of a logical path, `None` when unavailable.
pub type RemoteLoader = Arc<dyn Fn(&str) -> Result<Option<Value>> + Send + Sync>;

/// A metadata fragment key considered for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key: String,
    pub depth: usize,
    pub wildcards: usize,
}

/// Resolves the effective metadata of logical paths.
pub struct MetadataResolver {
    store: Arc<dyn MetadataStore>,
    local: Arc<dyn LocalResources>,
    schema: Option<Arc<dyn SchemaSource>>,
    remote: Option<RemoteLoader>,
    in_flight: Mutex<HashSet<InFlightKey>>,
}

/// Path being loaded, per thread: a cycle can only form on one call stack.
type InFlightKey = (ThreadId, String);

/// Membership in the in-flight set, released on drop.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<InFlightKey>>,
    key: InFlightKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

fn key_for(variant: &[String]) -> String {
    format!("/{}", variant.join("/"))
}

impl MetadataResolver {
    pub fn new(store: Arc<dyn MetadataStore>, local: Arc<dyn LocalResources>) -> Self {
        Self {
            store,
            local,
            schema: None,
            remote: None,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Arc<dyn SchemaSource>) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_remote_loader(mut self, loader: RemoteLoader) -> Self {
        self.remote = Some(loader);
        self
    }

    pub fn local(&self) -> &Arc<dyn LocalResources> {
        &self.local
    }

    /// Fragment keys for a path, least specific first.
    ///
    /// Deeper keys are more specific; at equal depth, fewer wildcards win.
    pub fn candidates(logical_path: &str) -> Vec<Candidate> {
        let segs = path::segments(logical_path);
        let is_collection = path::is_collection(logical_path);
        let collection_segs = if is_collection || segs.is_empty() {
            &segs[..]
        } else {
            &segs[..segs.len() - 1]
        };

        let mut out = vec![
            Candidate {
                key: "/".to_string(),
                depth: 0,
                wildcards: 0,
            },
            Candidate {
                key: key_for(&[path::WILDCARD.to_string()]),
                depth: 1,
                wildcards: 1,
            },
        ];
        for depth in 1..=collection_segs.len() {
            for (variant, wildcards) in path::wildcard_variants(&collection_segs[..depth]) {
                let key = key_for(&variant);
                out.push(Candidate {
                    key: format!("{key}/{}", path::WILDCARD),
                    depth: depth + 1,
                    wildcards: wildcards + 1,
                });
                out.push(Candidate {
                    key,
                    depth,
                    wildcards,
                });
            }
        }
        if !is_collection && !segs.is_empty() {
            for (variant, wildcards) in path::wildcard_variants(&segs) {
                out.push(Candidate {
                    key: key_for(&variant),
                    depth: segs.len(),
                    wildcards,
                });
            }
        }

        out.sort_by(|a, b| {
            a.depth
                .cmp(&b.depth)
                .then(b.wildcards.cmp(&a.wildcards))
                .then_with(|| a.key.cmp(&b.key))
        });
        let mut seen = HashSet::new();
        out.retain(|c| seen.insert(c.key.clone()));
        out
    }

    /// Existing fragments for a path in merge order, identity stripped from
    /// those shallower than the collection depth.
    fn fragments(&self, logical_path: &str) -> Result<Vec<ResourceMetadata>> {
        let segs = path::segments(logical_path);
        let collection_depth = if path::is_collection(logical_path) {
            segs.len()
        } else {
            segs.len().saturating_sub(1)
        };
        let mut fragments = Vec::new();
        for candidate in Self::candidates(logical_path) {
            let Some(fragment) = self.store.read_fragment(&candidate.key)? else {
                continue;
            };
            log::trace!("metadata {} <- {}", logical_path, candidate.key);
            if candidate.depth < collection_depth {
                fragments.push(strip_identity(fragment));
            } else {
                fragments.push(fragment);
            }
        }
        Ok(fragments)
    }

    /// Fragments merged over the built-in defaults, unrendered.
    pub fn merged(&self, logical_path: &str) -> Result<ResourceMetadata> {
        let fragments = self.fragments(logical_path)?;
        Ok(merge_all(defaults::builtin(logical_path), &fragments))
    }

    /// Fully resolved metadata for a path.
    pub fn resolve(&self, logical_path: &str) -> Result<ResourceMetadata> {
        let fragments = self.fragments(logical_path)?;
        let base = merge_all(defaults::builtin(logical_path), &fragments);
        let rendered = self.render(base, logical_path);

        let Some(source) = &self.schema else {
            return Ok(rendered);
        };
        let is_collection = path::is_collection(logical_path);
        let remote_path = {
            let record = ResourceRecord::new(logical_path, rendered.clone());
            if is_collection {
                record.collection_path()
            } else {
                let data = self.local_payload(logical_path);
                record.remote_resource_path(data.as_ref())
            }
        };
        let Some(layer) = schema::defaults_for(source.as_ref(), &remote_path, is_collection) else {
            return Ok(rendered);
        };
        log::debug!("schema defaults for {logical_path} via {remote_path}");
        let layered = merge_all(merge(defaults::builtin(logical_path), &layer), &fragments);
        Ok(self.render(layered, logical_path))
    }

    /// Resolved metadata plus the local payload.
    pub fn record(&self, logical_path: &str) -> Result<ResourceRecord> {
        let metadata = self.resolve(logical_path)?;
        let data = self.local.get_local_resource(logical_path)?;
        Ok(ResourceRecord::new(logical_path, metadata).with_data(data))
    }

    /// Whether a remote attribute load for `logical_path` is running on the
    /// calling thread.
    pub fn is_in_flight(&self, logical_path: &str) -> bool {
        let key = (thread::current().id(), path::normalize(logical_path));
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }

    fn enter(&self, logical_path: &str) -> Option<InFlightGuard<'_>> {
        let key = (thread::current().id(), path::normalize(logical_path));
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        if !inserted {
            return None;
        }
        Some(InFlightGuard {
            set: &self.in_flight,
            key,
        })
    }

    fn local_payload(&self, logical_path: &str) -> Option<Value> {
        match self.local.get_local_resource(logical_path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("ignoring local resource {logical_path}: {e}");
                None
            }
        }
    }

    fn remote_payload(&self, logical_path: &str) -> Option<Value> {
        let loader = self.remote.as_ref()?;
        let Some(_guard) = self.enter(logical_path) else {
            log::debug!("remote attributes for {logical_path} already loading, skipping");
            return None;
        };
        match loader(logical_path) {
            Ok(data) => data,
            Err(e) => {
                log::debug!("remote attributes for {logical_path} unavailable: {e}");
                None
            }
        }
    }

    /// Attributes of a resource for `{{../attr}}` placeholders.
    fn attributes(&self, logical_path: &str) -> Option<Value> {
        self.local_payload(logical_path)
            .or_else(|| self.remote_payload(logical_path))
            .filter(Value::is_object)
    }

    /// Local attributes of every prefix, deeper prefixes overriding.
    ///
    /// Remote loads are only attempted when some template still references
    /// a missing attribute, and never for the resource itself.
    fn template_context(&self, logical_path: &str, meta: &ResourceMetadata) -> Map<String, Value> {
        let prefixes = path::prefixes(logical_path);
        let mut layers: Vec<Option<Value>> = prefixes
            .iter()
            .map(|prefix| self.local_payload(prefix).filter(Value::is_object))
            .collect();
        let mut ctx = flatten(&layers);

        let needs_remote = self.remote.is_some()
            && template_strings(meta)
                .iter()
                .any(|raw| template::needs_more_context(raw, &ctx));
        if needs_remote {
            let strict = if path::is_collection(logical_path) {
                prefixes.len()
            } else {
                prefixes.len().saturating_sub(1)
            };
            for (layer, prefix) in layers.iter_mut().zip(&prefixes).take(strict) {
                if layer.is_none() {
                    *layer = self.remote_payload(prefix).filter(Value::is_object);
                }
            }
            ctx = flatten(&layers);
        }
        ctx
    }

    /// Render every template of `meta` for `logical_path`.
    fn render(&self, mut meta: ResourceMetadata, logical_path: &str) -> ResourceMetadata {
        let mut ctx = self.template_context(logical_path, &meta);
        let is_collection = path::is_collection(logical_path);

        // Operation paths and headers keep `{{.id}}`/`{{.alias}}` for the
        // request-time pass; everything else sees the resolved identity.
        let mut path_ctx = ctx.clone();
        path_ctx.remove("id");
        path_ctx.remove("alias");
        if is_collection {
            ctx.remove("id");
            ctx.remove("alias");
        } else {
            let last = Value::String(path::last_segment(logical_path));
            for (key, attr) in [("id", meta.id_attribute()), ("alias", meta.alias_attribute())] {
                if let Some(value) = attr.and_then(|attr| lookup_scalar(&ctx, attr)) {
                    ctx.insert(key.to_string(), value);
                }
                ctx.entry(key.to_string()).or_insert_with(|| last.clone());
            }
        }

        let relative = |p: &str| self.attributes(p);
        let scope = Scope::new(&ctx, logical_path).with_relative(&relative);
        let path_scope = Scope::new(&path_ctx, logical_path).with_relative(&relative);

        if let Some(info) = meta.resource_info.as_mut() {
            info.collection_path = scope.render(&info.collection_path);
        }
        if let Some(ops) = meta.operation_info.as_mut() {
            for kind in OperationKind::ALL {
                let Some(op) = ops.slot_mut(kind).as_mut() else {
                    continue;
                };
                if let Some(url) = op.url.as_mut() {
                    url.path = path_scope.render(&url.path);
                    if let Some(query) = url.query_strings.as_mut() {
                        for entry in query.iter_mut() {
                            *entry = scope.render(entry);
                        }
                    }
                }
                if let Some(headers) = op.http_headers.as_mut() {
                    for line in &mut headers.0 {
                        *line = path_scope.render(line);
                    }
                }
                op.jq_filter = scope.render(&op.jq_filter);
            }
        }
        meta
    }
}

fn flatten(layers: &[Option<Value>]) -> Map<String, Value> {
    let mut ctx = Map::new();
    for layer in layers.iter().flatten() {
        if let Value::Object(obj) = layer {
            for (key, value) in obj {
                ctx.insert(key.clone(), value.clone());
            }
        }
    }
    ctx
}

fn lookup_scalar(ctx: &Map<String, Value>, attr: &str) -> Option<Value> {
    let obj = Value::Object(ctx.clone());
    crate::payload::lookup_string(&obj, attr).map(Value::String)
}

/// Every template string a resolution renders.
fn template_strings(meta: &ResourceMetadata) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(info) = &meta.resource_info {
        out.push(info.collection_path.clone());
    }
    for kind in OperationKind::ALL {
        let Some(op) = meta.operation(kind) else {
            continue;
        };
        if let Some(url) = &op.url {
            out.push(url.path.clone());
            out.extend(url.query_strings.iter().flatten().cloned());
        }
        out.extend(op.http_headers.iter().flat_map(|h| h.iter().cloned()));
        out.push(op.jq_filter.clone());
    }
    out.retain(|s| template::has_placeholders(s));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryMetadata, MemoryResources, NoLocalResources};
    use crate::metadata::schema::OpenApiSchema;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn keys(path: &str) -> Vec<String> {
        MetadataResolver::candidates(path)
            .into_iter()
            .map(|c| c.key)
            .collect()
    }

    fn resolver(store: MemoryMetadata, local: MemoryResources) -> MetadataResolver {
        MetadataResolver::new(Arc::new(store), Arc::new(local))
    }

    #[test]
    fn test_candidates_for_item() {
        assert_eq!(
            keys("/users/alice"),
            vec!["/", "/_", "/users", "/_/_", "/_/alice", "/users/_", "/users/alice"]
        );
    }

    #[test]
    fn test_candidates_for_collection() {
        let keys = keys("/realms/master/");
        assert_eq!(keys.first().map(String::as_str), Some("/"));
        assert!(keys.contains(&"/realms/_".to_string()));
        assert!(keys.contains(&"/realms/master".to_string()));
        assert_eq!(keys.last().map(String::as_str), Some("/realms/master/_"));
    }

    #[test]
    fn test_candidates_are_unique_and_ordered() {
        let candidates = MetadataResolver::candidates("/a/b/c");
        let mut seen = HashSet::new();
        assert!(candidates.iter().all(|c| seen.insert(c.key.clone())));
        for pair in candidates.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.depth < b.depth || (a.depth == b.depth && a.wildcards >= b.wildcards));
        }
    }

    #[test]
    fn test_literal_deeper_fragment_wins() {
        let store = MemoryMetadata::new()
            .with_json("/a/_", json!({"resourceInfo": {"collectionPath": "/wild"}}))
            .with_json("/a/lit/b", json!({"resourceInfo": {"collectionPath": "/literal"}}));
        let meta = resolver(store, MemoryResources::new()).resolve("/a/lit/b").unwrap();
        assert_eq!(meta.resource_info.unwrap().collection_path, "/literal");
    }

    #[test]
    fn test_identity_stripped_above_collection_depth() {
        let store = MemoryMetadata::new()
            .with_json("/_", json!({"resourceInfo": {"idFromAttribute": "rootId"}}))
            .with_json("/teams/_/members/_", json!({"resourceInfo": {"aliasFromAttribute": "login"}}));
        let meta = resolver(store, MemoryResources::new())
            .resolve("/teams/core/members/ana")
            .unwrap();
        assert_eq!(meta.id_attribute(), Some("id"));
        assert_eq!(meta.alias_attribute(), Some("login"));

        let top = MemoryMetadata::new().with_json("/_", json!({"resourceInfo": {"idFromAttribute": "rootId"}}));
        let meta = resolver(top, MemoryResources::new()).resolve("/teams/core").unwrap();
        assert_eq!(meta.id_attribute(), Some("rootId"));
    }

    #[test]
    fn test_render_from_ancestor_context() {
        let store = MemoryMetadata::new().with_json(
            "/realms/_/clients/_",
            json!({
                "resourceInfo": {"collectionPath": "/admin/realms/{{.realm}}/clients", "idFromAttribute": "uuid"},
                "operationInfo": {
                    "getResource": {"url": {"path": "./{{.id}}"}},
                    "listCollection": {"url": {"queryStrings": ["realm={{.realm}}"]}}
                }
            }),
        );
        let local = MemoryResources::new()
            .with_resource("/realms/master", json!({"realm": "master-realm"}))
            .with_resource("/realms/master/clients/web", json!({"uuid": "c-1"}));
        let meta = resolver(store, local).resolve("/realms/master/clients/web").unwrap();
        assert_eq!(
            meta.resource_info.as_ref().unwrap().collection_path,
            "/admin/realms/master-realm/clients"
        );
        let get = meta.operation(OperationKind::Get).unwrap();
        assert_eq!(get.path_template(), Some("./{{.id}}"));
        let list = meta.operation(OperationKind::List).unwrap();
        assert_eq!(
            list.url.as_ref().unwrap().query_strings,
            Some(vec!["realm=master-realm".to_string()])
        );
    }

    #[test]
    fn test_unresolved_placeholders_stay_verbatim() {
        let store = MemoryMetadata::new().with_json(
            "/orgs/_/repos/_",
            json!({"resourceInfo": {"collectionPath": "/orgs/{{.orgId}}/repos"}}),
        );
        let meta = resolver(store, MemoryResources::new()).resolve("/orgs/acme/repos/api").unwrap();
        assert_eq!(meta.resource_info.unwrap().collection_path, "/orgs/{{.orgId}}/repos");
    }

    #[test]
    fn test_remote_loader_fills_missing_ancestor_attributes() {
        let store = MemoryMetadata::new().with_json(
            "/orgs/_/repos/_",
            json!({"resourceInfo": {"collectionPath": "/orgs/{{.orgId}}/repos"}}),
        );
        let requested = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requested);
        let loader: RemoteLoader = Arc::new(move |p: &str| -> Result<Option<Value>> {
            log.lock().unwrap().push(p.to_string());
            Ok((p == "/orgs/acme").then(|| json!({"orgId": "o-9"})))
        });
        let meta = resolver(store, MemoryResources::new())
            .with_remote_loader(loader)
            .resolve("/orgs/acme/repos/api")
            .unwrap();
        assert_eq!(meta.resource_info.unwrap().collection_path, "/orgs/o-9/repos");
        // Strict ancestors only, never the resource itself.
        assert_eq!(
            *requested.lock().unwrap(),
            vec!["/orgs", "/orgs/acme", "/orgs/acme/repos"]
        );
    }

    #[test]
    fn test_remote_loader_not_called_when_context_is_complete() {
        let store = MemoryMetadata::new().with_json(
            "/orgs/_/repos/_",
            json!({"resourceInfo": {"collectionPath": "/orgs/{{.orgId}}/repos"}}),
        );
        let local = MemoryResources::new().with_resource("/orgs/acme", json!({"orgId": "o-1"}));
        let loader: RemoteLoader =
            Arc::new(|_: &str| -> Result<Option<Value>> { panic!("remote load not expected") });
        let meta = resolver(store, local)
            .with_remote_loader(loader)
            .resolve("/orgs/acme/repos/api")
            .unwrap();
        assert_eq!(meta.resource_info.unwrap().collection_path, "/orgs/o-1/repos");
    }

    #[test]
    fn test_in_flight_guard_is_held_until_dropped() {
        let resolver = resolver(MemoryMetadata::new(), MemoryResources::new());
        let guard = resolver.enter("/orgs/acme").unwrap();
        assert!(resolver.is_in_flight("/orgs/acme"));
        assert!(resolver.enter("/orgs/acme").is_none());
        assert!(resolver.is_in_flight("/orgs/acme"));
        drop(guard);
        assert!(!resolver.is_in_flight("/orgs/acme"));
        assert!(resolver.enter("/orgs/acme").is_some());
    }

    #[test]
    fn test_in_flight_is_per_thread() {
        let resolver = resolver(MemoryMetadata::new(), MemoryResources::new());
        let _guard = resolver.enter("/orgs/acme").unwrap();
        std::thread::scope(|s| {
            s.spawn(|| {
                assert!(!resolver.is_in_flight("/orgs/acme"));
                assert!(resolver.enter("/orgs/acme").is_some());
            });
        });
        assert!(resolver.is_in_flight("/orgs/acme"));
    }

    #[test]
    fn test_in_flight_guard_breaks_cycles() {
        let store = MemoryMetadata::new().with_json(
            "/orgs/_/repos/_",
            json!({"resourceInfo": {"collectionPath": "/orgs/{{.orgId}}/repos"}}),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let resolver = Arc::new_cyclic(|weak: &std::sync::Weak<MetadataResolver>| {
            let weak = weak.clone();
            let loader: RemoteLoader = Arc::new(move |p: &str| -> Result<Option<Value>> {
                assert!(counter.fetch_add(1, Ordering::SeqCst) < 32, "remote load recursed");
                let Some(resolver) = weak.upgrade() else {
                    return Ok(None);
                };
                // Loading an ancestor re-resolves the very path that asked for it.
                assert!(resolver.is_in_flight(p));
                resolver.resolve("/orgs/acme/repos/api")?;
                assert!(resolver.is_in_flight(p));
                Ok(None)
            });
            MetadataResolver::new(Arc::new(store), Arc::new(NoLocalResources))
                .with_remote_loader(loader)
        });
        let meta = resolver.resolve("/orgs/acme/repos/api").unwrap();
        assert_eq!(meta.resource_info.unwrap().collection_path, "/orgs/{{.orgId}}/repos");
        // Each nested resolve only loads ancestors not already in flight:
        // 3 * (1 + 2 * (1 + 1)) loads in total.
        assert_eq!(calls.load(Ordering::SeqCst), 15);
        for ancestor in ["/orgs", "/orgs/acme", "/orgs/acme/repos"] {
            assert!(!resolver.is_in_flight(ancestor));
        }
    }

    #[test]
    fn test_relative_placeholder_does_not_trigger_remote_load() {
        let store = MemoryMetadata::new().with_json(
            "/groups/_/members/_",
            json!({"resourceInfo": {"collectionPath": "/api/groups/{{../../id}}/members"}}),
        );
        let local = MemoryResources::new().with_resource("/groups/admins", json!({"id": "g-7"}));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let loader: RemoteLoader = Arc::new(move |_: &str| -> Result<Option<Value>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        });
        let meta = resolver(store, local)
            .with_remote_loader(loader)
            .resolve("/groups/admins/members/x")
            .unwrap();
        assert_eq!(meta.resource_info.unwrap().collection_path, "/api/groups/g-7/members");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_item_identity_and_path_placeholders() {
        let store = MemoryMetadata::new().with_json(
            "/users/_",
            json!({
                "resourceInfo": {"idFromAttribute": "uuid", "aliasFromAttribute": "login"},
                "operationInfo": {
                    "updateResource": {"url": {"path": "/api/users/{{.id}}"}, "httpHeaders": ["X-User: {{.alias}}"]},
                    "getResource": {"jqFilter": "{{.alias}}"}
                }
            }),
        );
        let local = MemoryResources::new().with_resource("/users/ana", json!({"uuid": "u-1", "login": "ana"}));
        let meta = resolver(store, local).resolve("/users/ana").unwrap();
        let update = meta.operation(OperationKind::Update).unwrap();
        assert_eq!(update.path_template(), Some("/api/users/{{.id}}"));
        assert_eq!(update.http_headers.as_ref().unwrap().0, vec!["X-User: {{.alias}}".to_string()]);
        assert_eq!(meta.operation(OperationKind::Get).unwrap().jq_filter, "ana");
    }

    #[test]
    fn test_relative_placeholder_in_collection_path() {
        let store = MemoryMetadata::new().with_json(
            "/groups/_/members/_",
            json!({"resourceInfo": {"collectionPath": "/api/groups/{{../../id}}/members"}}),
        );
        let local = MemoryResources::new().with_resource("/groups/admins", json!({"id": "g-7"}));
        let meta = resolver(store, local).resolve("/groups/admins/members/ana").unwrap();
        assert_eq!(meta.resource_info.unwrap().collection_path, "/api/groups/g-7/members");
    }

    #[test]
    fn test_merged_is_unrendered() {
        let store = MemoryMetadata::new().with_json(
            "/orgs/_/repos/_",
            json!({"resourceInfo": {"collectionPath": "/orgs/{{.orgId}}/repos"}}),
        );
        let local = MemoryResources::new().with_resource("/orgs/acme", json!({"orgId": "o-1"}));
        let merged = resolver(store, local).merged("/orgs/acme/repos/api").unwrap();
        assert_eq!(merged.resource_info.unwrap().collection_path, "/orgs/{{.orgId}}/repos");
    }

    #[test]
    fn test_malformed_fragment_propagates() {
        struct Broken;
        impl MetadataStore for Broken {
            fn read_fragment(&self, key: &str) -> Result<Option<ResourceMetadata>> {
                Err(crate::error::Error::MetadataParse {
                    key: key.to_string(),
                    message: "bad".into(),
                })
            }
        }
        let resolver = MetadataResolver::new(Arc::new(Broken), Arc::new(NoLocalResources));
        assert!(resolver.resolve("/a/b").is_err());
    }

    #[test]
    fn test_schema_defaults_sit_below_fragments() {
        let schema = OpenApiSchema::from_document(&json!({
            "paths": {
                "/users": {"get": {}, "post": {}},
                "/users/{userId}": {"get": {}, "patch": {}, "delete": {}}
            }
        }))
        .unwrap();
        let store = MemoryMetadata::new().with_json(
            "/users/_",
            json!({"resourceInfo": {"aliasFromAttribute": "login"}}),
        );
        let meta = resolver(store, MemoryResources::new())
            .with_schema(Arc::new(schema))
            .resolve("/users/ana")
            .unwrap();
        assert_eq!(meta.id_attribute(), Some("userId"));
        assert_eq!(meta.alias_attribute(), Some("login"));
        assert_eq!(meta.operation(OperationKind::Update).unwrap().method(), "PATCH");
    }

    #[test]
    fn test_record_carries_local_data() {
        let local = MemoryResources::new().with_resource("/users/ana", json!({"id": "9"}));
        let record = resolver(MemoryMetadata::new(), local).record("/users/ana").unwrap();
        assert_eq!(record.remote_resource_path(record.data.as_ref()), "/users/9");
    }
}
