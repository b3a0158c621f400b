//! Context file: where the server, repository and metadata live.
//!
//! ```toml
//! [server]
//! base_url = "https://keycloak.example.com"
//! headers = { Authorization = "Bearer ${TOKEN}" }
//!
//! [repository]
//! dir = "~/declarest/acme"
//!
//! [metadata]
//! openapi = "openapi.yaml"
//!
//! [secrets]
//! file = "secrets.json"
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub server: ServerConfig,
    pub repository: RepositoryConfig,
    pub metadata: MetadataConfig,
    pub secrets: SecretsConfig,

    /// Directory of the file this was loaded from; relative paths resolve
    /// against it.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    /// Static headers sent with every request; values are env-expanded.
    pub headers: BTreeMap<String, String>,
    /// Fetch ancestor resources from the server to render metadata templates
    pub remote_context: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            headers: BTreeMap::new(),
            remote_context: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub dir: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Defaults to the repository directory
    pub dir: Option<String>,
    pub openapi: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub file: Option<String>,
}

impl ContextConfig {
    /// Load and validate a context file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid context file {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        log::debug!("Loaded context from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.server.base_url.trim().is_empty() {
            bail!("server.base_url is required");
        }
        Ok(config)
    }

    pub fn repository_dir(&self) -> PathBuf {
        paths::resolve_from(&self.base_dir, &self.repository.dir)
    }

    pub fn metadata_dir(&self) -> PathBuf {
        match &self.metadata.dir {
            Some(dir) => paths::resolve_from(&self.base_dir, dir),
            None => self.repository_dir(),
        }
    }

    pub fn openapi_file(&self) -> Option<PathBuf> {
        self.metadata
            .openapi
            .as_deref()
            .map(|file| paths::resolve_from(&self.base_dir, file))
    }

    pub fn secrets_file(&self) -> Option<PathBuf> {
        self.secrets
            .file
            .as_deref()
            .map(|file| paths::resolve_from(&self.base_dir, file))
    }

    /// Static headers with `$VAR` references expanded
    pub fn headers(&self) -> Vec<(String, String)> {
        self.server
            .headers
            .iter()
            .map(|(name, value)| {
                let value = shellexpand::env(value).map_or_else(|_| value.clone(), |v| v.into_owned());
                (name.clone(), value)
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
