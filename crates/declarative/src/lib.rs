//! # Declarative
//!
//! Reconciliation and identity resolution for declaratively managed REST
//! resources.
//!
//! Resources live under logical paths such as `/realms/acme/clients/web`.
//! Metadata fragments, keyed by path variants with `_` wildcards, describe
//! how a logical path maps to the server: which attribute holds the remote
//! id, which holds the human-friendly alias, where the collection lives and
//! how each operation is requested.
//!
//! ## Core Concepts
//!
//! - **ResourceMetadata**: merged identity and operation rules for a path
//! - **ResourceRecord**: a logical path with its rendered metadata and data
//! - **RequestSpec**: a fully built HTTP request for one operation
//! - **Reconciler**: resolves remote identity and runs get, list, create,
//!   update, delete and save against a [`backend::ResourceServer`]
//!
//! ## Example
//!
//! ```
//! use declarative::backend::{MemoryMetadata, MemoryResources, MockServer};
//! use declarative::Reconciler;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let server = MockServer::new();
//! let local = MemoryResources::new().with_resource("/users/ana", json!({"id": "u-1"}));
//! let reconciler = Reconciler::builder(Arc::new(server.clone()))
//!     .with_metadata(Arc::new(MemoryMetadata::new()))
//!     .with_local(Arc::new(local))
//!     .build();
//!
//! assert_eq!(reconciler.get_remote_resource_path("/users/ana").unwrap(), "/users/u-1");
//! ```
//!
//! ## Collaborator Traits
//!
//! The reconciler only talks to the outside world through traits:
//!
//! - [`backend::ResourceServer`]: the remote REST API
//! - [`backend::MetadataStore`]: metadata fragments by key
//! - [`backend::LocalResources`]: locally declared resource payloads
//! - [`secrets::SecretStore`]: values for `{{secret .}}` placeholders
//!
//! In-memory implementations of each live in [`backend`] and [`secrets`].

pub mod backend;
pub mod error;
pub mod filter;
pub mod headers;
pub mod jq;
pub mod metadata;
pub mod path;
pub mod payload;
pub mod reconciler;
pub mod record;
pub mod request;
pub mod secrets;

// Re-export main types at crate root
pub use error::{Error, ErrorCategory, Result};
pub use metadata::{
    MetadataResolver, OpenApiSchema, OperationInfo, OperationKind, OperationMetadata,
    PayloadConfig, ResourceInfo, ResourceMetadata, SchemaSource, UrlMetadata,
};
pub use reconciler::{
    Reconciler, ReconcilerBuilder, RemoteEntry, SaveFailure, SaveOutcome, SaveSummary,
};
pub use record::ResourceRecord;
pub use request::RequestSpec;
pub use secrets::{MemorySecrets, SecretStore};
