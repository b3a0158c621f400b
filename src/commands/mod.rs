//! Command implementations.

pub mod inspect;
pub mod resource;

use anyhow::{Context as AnyhowContext, Result};
use declarative::backend::{FsMetadataStore, FsRepository, HttpResourceServer};
use declarative::{MemorySecrets, OpenApiSchema, Reconciler};
use std::fs;
use std::sync::Arc;

use crate::Context;
use crate::config::ContextConfig;
use crate::paths;

/// A loaded context: the reconciler plus the local repository it reads.
pub struct Session {
    pub reconciler: Arc<Reconciler>,
    pub repository: Arc<FsRepository>,
}

impl Session {
    /// Load the context file and wire the adapters.
    pub fn open(ctx: &Context) -> Result<Self> {
        let file = paths::config_file(ctx.config.as_deref())?;
        let config = ContextConfig::load(&file)?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &ContextConfig) -> Result<Self> {
        let mut server = HttpResourceServer::new(config.server.base_url.trim());
        for (name, value) in config.headers() {
            server = server.with_header(name, value);
        }

        let repository = Arc::new(FsRepository::new(config.repository_dir()));
        let metadata = Arc::new(FsMetadataStore::new(config.metadata_dir()));
        log::debug!(
            "server {}, repository {}, metadata {}",
            server.base_url(),
            repository.root().display(),
            metadata.root().display()
        );

        let mut builder = Reconciler::builder(Arc::new(server))
            .with_metadata(metadata)
            .with_local(repository.clone());

        if let Some(file) = config.openapi_file() {
            let schema = OpenApiSchema::load(&file)
                .with_context(|| format!("Could not load OpenAPI document {}", file.display()))?;
            log::info!("Loaded {} schema paths from {}", schema.len(), file.display());
            builder = builder.with_schema(Arc::new(schema));
        }

        if let Some(file) = config.secrets_file() {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Could not read {}", file.display()))?;
            let doc: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Invalid secrets file {}", file.display()))?;
            builder = builder.with_secrets(Arc::new(MemorySecrets::from_value(&doc)?));
        }

        if !config.server.remote_context {
            builder = builder.without_remote_context();
        }

        Ok(Self {
            reconciler: builder.build(),
            repository,
        })
    }
}
