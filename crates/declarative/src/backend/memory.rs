//! In-memory metadata and resource stores.

use super::{LocalResources, MetadataStore};
use crate::error::{Error, Result};
use crate::metadata::ResourceMetadata;
use crate::path;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Metadata fragments held in memory, keyed like [`super::FsMetadataStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadata {
    fragments: Arc<Mutex<BTreeMap<String, ResourceMetadata>>>,
}

impl MemoryMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fragment under `key`.
    pub fn insert(&self, key: &str, fragment: ResourceMetadata) {
        self.fragments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path::normalize(key), fragment);
    }

    /// Store a fragment given as JSON.
    pub fn insert_json(&self, key: &str, fragment: Value) -> Result<()> {
        let fragment = serde_json::from_value(fragment).map_err(|e| Error::MetadataParse {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.insert(key, fragment);
        Ok(())
    }

    /// Builder form of [`Self::insert_json`] for fixtures.
    #[must_use]
    pub fn with_json(self, key: &str, fragment: Value) -> Self {
        if let Err(e) = self.insert_json(key, fragment) {
            log::warn!("skipping metadata fragment {key}: {e}");
        }
        self
    }

    pub fn len(&self) -> usize {
        self.fragments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataStore for MemoryMetadata {
    fn read_fragment(&self, key: &str) -> Result<Option<ResourceMetadata>> {
        Ok(self
            .fragments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&path::normalize(key))
            .cloned())
    }
}

/// Local resources held in memory, keyed by normalized logical path.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    resources: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl MemoryResources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, logical_path: &str, payload: Value) {
        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path::normalize(logical_path), payload);
    }

    #[must_use]
    pub fn with_resource(self, logical_path: &str, payload: Value) -> Self {
        self.insert(logical_path, payload);
        self
    }

    pub fn remove(&self, logical_path: &str) -> Option<Value> {
        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&path::normalize(logical_path))
    }
}

impl LocalResources for MemoryResources {
    fn get_local_resource(&self, logical_path: &str) -> Result<Option<Value>> {
        if path::is_collection(logical_path) {
            return Ok(None);
        }
        Ok(self
            .resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&path::normalize(logical_path))
            .cloned())
    }

    fn list_resource_paths(&self) -> Result<Vec<String>> {
        Ok(self
            .resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_metadata_keys_are_normalized() {
        let store = MemoryMetadata::new()
            .with_json("/users/_/", json!({"resourceInfo": {"idFromAttribute": "uuid"}}));
        let fragment = store.read_fragment("/users/_").unwrap().unwrap();
        assert_eq!(fragment.id_attribute(), Some("uuid"));
        assert!(store.read_fragment("/users").unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_metadata_rejects_bad_fragment() {
        let store = MemoryMetadata::new();
        let err = store
            .insert_json("/x", json!({"resourceInfo": {"idFromAttribute": 5}}))
            .unwrap_err();
        assert!(matches!(err, Error::MetadataParse { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_resources() {
        let repo = MemoryResources::new()
            .with_resource("/users/alice", json!({"name": "alice"}))
            .with_resource("/teams/core", json!({"name": "core"}));
        assert_eq!(
            repo.get_local_resource("/users/alice/").unwrap(),
            None
        );
        assert_eq!(
            repo.get_local_resource("users/alice").unwrap(),
            Some(json!({"name": "alice"}))
        );
        assert_eq!(
            repo.list_resource_paths().unwrap(),
            vec!["/teams/core".to_string(), "/users/alice".to_string()]
        );
        assert!(repo.remove("/teams/core").is_some());
        assert_eq!(repo.get_local_resource("/teams/core").unwrap(), None);
    }
}
