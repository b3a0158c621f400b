//! Recording in-memory resource server for tests.

use super::ResourceServer;
use crate::error::{Error, Result};
use crate::path;
use crate::request::RequestSpec;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

/// Which trait method a recorded call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Get,
    List,
    Create,
    Update,
    Delete,
    Exists,
}

/// One recorded server call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub kind: CallKind,
    pub method: String,
    pub path: String,
    pub payload: Option<Value>,
}

/// In-memory server that records every call it receives.
///
/// Resources are stored by normalized remote path. A collection lists the
/// resources directly below it unless explicit items were configured.
#[derive(Debug, Clone, Default)]
pub struct MockServer {
    resources: Arc<Mutex<BTreeMap<String, Value>>>,
    collections: Arc<Mutex<BTreeMap<String, Vec<Value>>>>,
    conflicts: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockServer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a resource at a remote path.
    pub fn insert_resource(&self, remote_path: &str, value: Value) {
        locked(&self.resources).insert(path::normalize(remote_path), value);
    }

    #[must_use]
    pub fn with_resource(self, remote_path: &str, value: Value) -> Self {
        self.insert_resource(remote_path, value);
        self
    }

    /// Serve fixed items for a collection path instead of its children.
    #[must_use]
    pub fn with_collection(self, remote_path: &str, items: Vec<Value>) -> Self {
        locked(&self.collections).insert(path::normalize(remote_path), items);
        self
    }

    /// Make creates against `remote_path` fail with a conflict.
    #[must_use]
    pub fn with_conflict(self, remote_path: &str) -> Self {
        locked(&self.conflicts).insert(path::normalize(remote_path));
        self
    }

    /// Current resource at a remote path.
    pub fn resource(&self, remote_path: &str) -> Option<Value> {
        locked(&self.resources)
            .get(&path::normalize(remote_path))
            .cloned()
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        locked(&self.calls).clone()
    }

    /// Calls of one kind.
    pub fn calls_of(&self, kind: CallKind) -> Vec<Call> {
        locked(&self.calls)
            .iter()
            .filter(|call| call.kind == kind)
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.calls_of(kind).len()
    }

    pub fn clear_calls(&self) {
        locked(&self.calls).clear();
    }

    fn record(&self, kind: CallKind, spec: &RequestSpec, payload: Option<&Value>) -> String {
        let target = path::normalize(&spec.path);
        locked(&self.calls).push(Call {
            kind,
            method: spec.method.clone(),
            path: target.clone(),
            payload: payload.cloned(),
        });
        target
    }
}

impl ResourceServer for MockServer {
    fn get_resource(&self, spec: &RequestSpec) -> Result<Value> {
        let target = self.record(CallKind::Get, spec, None);
        locked(&self.resources)
            .get(&target)
            .cloned()
            .ok_or_else(|| Error::not_found(&spec.method, target))
    }

    fn get_collection(&self, spec: &RequestSpec) -> Result<Vec<Value>> {
        let target = self.record(CallKind::List, spec, None);
        if let Some(items) = locked(&self.collections).get(&target) {
            return Ok(items.clone());
        }
        Ok(locked(&self.resources)
            .iter()
            .filter(|(key, _)| path::parent(key) == target)
            .map(|(_, value)| value.clone())
            .collect())
    }

    fn create_resource(&self, payload: &Value, spec: &RequestSpec) -> Result<Value> {
        let target = self.record(CallKind::Create, spec, Some(payload));
        if locked(&self.conflicts).contains(&target) {
            return Err(Error::conflict(&spec.method, target));
        }
        let stored_at = match crate::payload::lookup_string(payload, "id") {
            Some(id) if spec.method == "POST" => path::join(&target, &id),
            _ => target,
        };
        locked(&self.resources).insert(stored_at, payload.clone());
        Ok(payload.clone())
    }

    fn update_resource(&self, payload: &Value, spec: &RequestSpec) -> Result<Value> {
        let target = self.record(CallKind::Update, spec, Some(payload));
        let mut resources = locked(&self.resources);
        match resources.get_mut(&target) {
            Some(existing) => {
                *existing = payload.clone();
                Ok(payload.clone())
            }
            None => Err(Error::not_found(&spec.method, target)),
        }
    }

    fn delete_resource(&self, spec: &RequestSpec) -> Result<()> {
        let target = self.record(CallKind::Delete, spec, None);
        locked(&self.resources)
            .remove(&target)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(&spec.method, target))
    }

    fn resource_exists(&self, spec: &RequestSpec) -> Result<bool> {
        let target = self.record(CallKind::Exists, spec, None);
        Ok(locked(&self.resources).contains_key(&target))
    }
}
