//! Directory-backed metadata store and resource repository.
//!
//! Layout mirrors logical paths:
//!
//! ```text
//! metadata/users/_/metadata.json      fragment for every /users/<x>
//! metadata/users/metadata.json        fragment for the /users collection
//! resources/users/alice/resource.json payload of /users/alice
//! ```

use super::{LocalResources, MetadataStore};
use crate::error::{Error, Result};
use crate::metadata::ResourceMetadata;
use crate::path;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name of a metadata fragment inside its key directory.
pub const METADATA_FILE: &str = "metadata.json";

/// File name of a resource payload inside its path directory.
pub const RESOURCE_FILE: &str = "resource.json";

fn dir_for(root: &Path, logical_path: &str) -> PathBuf {
    path::segments(logical_path)
        .iter()
        .fold(root.to_path_buf(), |dir, seg| dir.join(seg))
}

fn read_optional(file: &Path) -> Result<Option<String>> {
    match fs::read_to_string(file) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(file, e)),
    }
}

/// Metadata fragments stored as `<dir>/<key>/metadata.json`.
#[derive(Debug, Clone)]
pub struct FsMetadataStore {
    root: PathBuf,
}

impl FsMetadataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the fragment for `key`.
    pub fn fragment_file(&self, key: &str) -> PathBuf {
        dir_for(&self.root, key).join(METADATA_FILE)
    }
}

impl MetadataStore for FsMetadataStore {
    fn read_fragment(&self, key: &str) -> Result<Option<ResourceMetadata>> {
        let file = self.fragment_file(key);
        let Some(content) = read_optional(&file)? else {
            return Ok(None);
        };
        let fragment = serde_json::from_str(&content).map_err(|e| Error::MetadataParse {
            key: path::normalize(key),
            message: e.to_string(),
        })?;
        log::trace!("metadata fragment {} from {}", key, file.display());
        Ok(Some(fragment))
    }
}

/// Resource payloads stored as `<dir>/<path>/resource.json`.
#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resource_file(&self, logical_path: &str) -> PathBuf {
        dir_for(&self.root, logical_path).join(RESOURCE_FILE)
    }

    /// Write a payload, creating parent directories.
    pub fn save_local_resource(&self, logical_path: &str, payload: &Value) -> Result<PathBuf> {
        path::validate(logical_path)?;
        let file = self.resource_file(logical_path);
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let mut content = serde_json::to_string_pretty(payload)?;
        content.push('\n');
        fs::write(&file, content).map_err(|e| Error::io(&file, e))?;
        Ok(file)
    }
}

impl LocalResources for FsRepository {
    fn get_local_resource(&self, logical_path: &str) -> Result<Option<Value>> {
        if path::is_collection(logical_path) {
            return Ok(None);
        }
        let file = self.resource_file(logical_path);
        let Some(content) = read_optional(&file)? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&content)
            .map_err(|e| Error::Other(format!("invalid resource {}: {e}", file.display())))?;
        Ok(Some(value))
    }

    fn list_resource_paths(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() || entry.file_name() != RESOURCE_FILE {
                continue;
            }
            let Some(dir) = entry.path().parent() else {
                continue;
            };
            let Ok(relative) = dir.strip_prefix(&self.root) else {
                continue;
            };
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if segments.is_empty() {
                continue;
            }
            paths.push(format!("/{}", segments.join("/")));
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_fragment() {
        let dir = TempDir::new().unwrap();
        let store = FsMetadataStore::new(dir.path());
        let file = store.fragment_file("/users/_");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, r#"{"resourceInfo": {"idFromAttribute": "uuid"}}"#).unwrap();

        let fragment = store.read_fragment("/users/_").unwrap().unwrap();
        assert_eq!(fragment.id_attribute(), Some("uuid"));
        assert!(store.read_fragment("/teams/_").unwrap().is_none());
    }

    #[test]
    fn test_root_fragment_lives_at_store_root() {
        let dir = TempDir::new().unwrap();
        let store = FsMetadataStore::new(dir.path());
        assert_eq!(store.fragment_file("/"), dir.path().join(METADATA_FILE));
    }

    #[test]
    fn test_malformed_fragment_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let store = FsMetadataStore::new(dir.path());
        let file = store.fragment_file("/users");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "{not json").unwrap();

        let err = store.read_fragment("/users").unwrap_err();
        assert!(matches!(err, Error::MetadataParse { ref key, .. } if key == "/users"));
    }

    #[test]
    fn test_repository_round_trip_and_listing() {
        let dir = TempDir::new().unwrap();
        let repo = FsRepository::new(dir.path());
        repo.save_local_resource("/users/alice", &json!({"name": "alice"}))
            .unwrap();
        repo.save_local_resource("/realms/master/clients/web", &json!({"clientId": "web"}))
            .unwrap();

        assert_eq!(
            repo.get_local_resource("/users/alice").unwrap(),
            Some(json!({"name": "alice"}))
        );
        assert_eq!(repo.get_local_resource("/users/bob").unwrap(), None);
        assert_eq!(repo.get_local_resource("/users/").unwrap(), None);
        assert_eq!(
            repo.list_resource_paths().unwrap(),
            vec![
                "/realms/master/clients/web".to_string(),
                "/users/alice".to_string()
            ]
        );
    }

    #[test]
    fn test_save_rejects_invalid_path() {
        let dir = TempDir::new().unwrap();
        let repo = FsRepository::new(dir.path());
        assert!(repo.save_local_resource("/users/_", &json!({})).is_err());
    }

    #[test]
    fn test_listing_missing_root_is_empty() {
        let repo = FsRepository::new("/nonexistent/declarest-test-root");
        assert!(repo.list_resource_paths().unwrap().is_empty());
    }
}
