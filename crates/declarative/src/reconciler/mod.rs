//! Reconciles local resource intents against the remote server.
//!
//! Every call resolves fresh metadata, builds the records and request specs
//! it needs, and talks to the [`ResourceServer`]. The only state kept between
//! requests is the collection listings of the operation in progress. Fallback chains only trigger
//! on the error category they handle (not-found or conflict); anything else
//! propagates unchanged.
//!
//! ```
//! use declarative::backend::{MemoryMetadata, MemoryResources, MockServer};
//! use declarative::Reconciler;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let server = MockServer::new().with_resource("/users/42", json!({"id": "42", "name": "ana"}));
//! let metadata = MemoryMetadata::new()
//!     .with_json("/users/_", json!({"resourceInfo": {"aliasFromAttribute": "name"}}));
//! let reconciler = Reconciler::builder(Arc::new(server.clone()))
//!     .with_metadata(Arc::new(metadata))
//!     .with_local(Arc::new(MemoryResources::new()))
//!     .build();
//!
//! let user = reconciler.get_remote_resource("/users/ana").unwrap();
//! assert_eq!(user["id"], "42");
//! ```

mod batch;
mod list;
mod read;
mod resolve;
mod scope;
mod write;

pub use batch::{SaveFailure, SaveSummary};
pub use list::RemoteEntry;
pub use write::SaveOutcome;

use crate::backend::{LocalResources, MemoryMetadata, MetadataStore, NoLocalResources, ResourceServer};
use crate::error::Result;
use crate::metadata::{MetadataResolver, RemoteLoader, SchemaSource};
use crate::secrets::SecretStore;
use scope::{CollectionCache, OperationGuard};
use serde_json::Value;
use std::sync::{Arc, Weak};

/// Translates CRUD and list intents on logical paths into remote requests.
pub struct Reconciler {
    server: Arc<dyn ResourceServer>,
    resolver: Arc<MetadataResolver>,
    local: Arc<dyn LocalResources>,
    secrets: Option<Arc<dyn SecretStore>>,
    collections: CollectionCache,
}

impl Reconciler {
    /// Start building a reconciler around a server.
    pub fn builder(server: Arc<dyn ResourceServer>) -> ReconcilerBuilder {
        ReconcilerBuilder::new(server)
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    pub fn has_secret_store(&self) -> bool {
        self.secrets.is_some()
    }

    /// Enter a public operation; nested calls on this thread share its
    /// collection listings.
    fn operation(&self) -> OperationGuard<'_> {
        self.collections.begin()
    }
}

/// Wires collaborators into a shared [`Reconciler`].
pub struct ReconcilerBuilder {
    server: Arc<dyn ResourceServer>,
    metadata: Arc<dyn MetadataStore>,
    local: Arc<dyn LocalResources>,
    schema: Option<Arc<dyn SchemaSource>>,
    secrets: Option<Arc<dyn SecretStore>>,
    remote_context: bool,
}

impl ReconcilerBuilder {
    pub fn new(server: Arc<dyn ResourceServer>) -> Self {
        Self {
            server,
            metadata: Arc::new(MemoryMetadata::new()),
            local: Arc::new(NoLocalResources),
            schema: None,
            secrets: None,
            remote_context: true,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataStore>) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_local(mut self, local: Arc<dyn LocalResources>) -> Self {
        self.local = local;
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Arc<dyn SchemaSource>) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_secrets(mut self, secrets: Arc<dyn SecretStore>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    /// Never fetch ancestor attributes from the server while rendering
    /// metadata templates.
    #[must_use]
    pub fn without_remote_context(mut self) -> Self {
        self.remote_context = false;
        self
    }

    /// Build the reconciler.
    ///
    /// The metadata resolver gets a loader holding a weak handle back to the
    /// reconciler, so the two never keep each other alive.
    pub fn build(self) -> Arc<Reconciler> {
        Arc::new_cyclic(|weak: &Weak<Reconciler>| {
            let mut resolver = MetadataResolver::new(self.metadata, Arc::clone(&self.local));
            if let Some(schema) = self.schema {
                resolver = resolver.with_schema(schema);
            }
            if self.remote_context {
                resolver = resolver.with_remote_loader(remote_loader(weak.clone()));
            }
            Reconciler {
                server: self.server,
                resolver: Arc::new(resolver),
                local: self.local,
                secrets: self.secrets,
                collections: CollectionCache::default(),
            }
        })
    }
}

fn remote_loader(reconciler: Weak<Reconciler>) -> RemoteLoader {
    Arc::new(move |logical_path: &str| -> Result<Option<Value>> {
        let Some(reconciler) = reconciler.upgrade() else {
            return Ok(None);
        };
        match reconciler.get_remote_resource(logical_path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    })
}
