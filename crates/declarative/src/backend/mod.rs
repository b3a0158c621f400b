//! Collaborator interfaces consumed by the reconciler.
//!
//! The reconciler never talks to HTTP, the filesystem or a secret vault
//! directly. It goes through these traits, which keeps the fallback logic
//! testable with the in-memory implementations:
//!
//! ```
//! use declarative::backend::{MockServer, ResourceServer};
//! use declarative::RequestSpec;
//! use serde_json::json;
//!
//! let server = MockServer::new().with_resource("/api/users/42", json!({"id": "42"}));
//! let spec = RequestSpec { method: "GET".into(), path: "/api/users/42".into(), ..Default::default() };
//! assert_eq!(server.get_resource(&spec).unwrap()["id"], "42");
//! ```

pub mod fs;
pub mod http;
pub mod memory;
pub mod mock;

pub use fs::{FsMetadataStore, FsRepository};
pub use http::HttpResourceServer;
pub use memory::{MemoryMetadata, MemoryResources};
pub use mock::{Call, CallKind, MockServer};

use crate::error::Result;
use crate::metadata::ResourceMetadata;
use crate::request::RequestSpec;
use serde_json::Value;

/// Remote REST-style backend.
///
/// Implementations classify failures through [`crate::Error::category`]:
/// absent targets must report not-found, identity collisions conflict.
pub trait ResourceServer: Send + Sync {
    /// Fetch a single resource.
    fn get_resource(&self, spec: &RequestSpec) -> Result<Value>;

    /// Fetch every item of a collection.
    fn get_collection(&self, spec: &RequestSpec) -> Result<Vec<Value>>;

    /// Create a resource; returns the server's representation.
    fn create_resource(&self, payload: &Value, spec: &RequestSpec) -> Result<Value>;

    /// Replace or patch a resource; returns the server's representation.
    fn update_resource(&self, payload: &Value, spec: &RequestSpec) -> Result<Value>;

    /// Delete a resource.
    fn delete_resource(&self, spec: &RequestSpec) -> Result<()>;

    /// Probe a resource without failing on absence.
    fn resource_exists(&self, spec: &RequestSpec) -> Result<bool> {
        match self.get_resource(spec) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Local resource repository.
pub trait LocalResources: Send + Sync {
    /// Payload stored at a logical path, `None` when absent.
    fn get_local_resource(&self, path: &str) -> Result<Option<Value>>;

    /// Logical paths of every stored resource.
    fn list_resource_paths(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Read-only store of metadata fragments.
///
/// Keys are normalized logical paths that may contain the wildcard segment,
/// e.g. `/realms/_/clients/_`. A collection-wide fragment for the items of
/// `/users/` lives under `/users/_`; the fragment for the collection itself
/// under `/users`.
pub trait MetadataStore: Send + Sync {
    fn read_fragment(&self, key: &str) -> Result<Option<ResourceMetadata>>;
}

/// Repository without any stored resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocalResources;

impl LocalResources for NoLocalResources {
    fn get_local_resource(&self, _path: &str) -> Result<Option<Value>> {
        Ok(None)
    }
}
