//! Path resolution for declarest
//!
//! # Environment Variables
//!
//! - `DECLAREST_CONFIG` - Override the context file (e.g., `~/work/acme.toml`)
//!
//! # Context File Priority
//!
//! 1. `--config` flag
//! 2. `DECLAREST_CONFIG` environment variable
//! 3. `XDG_CONFIG_HOME/declarest/config.toml` (if set)
//! 4. `~/.config/declarest/config.toml`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for context file override
pub const ENV_CONFIG: &str = "DECLAREST_CONFIG";

/// Default context file name
pub const CONFIG_FILE: &str = "config.toml";

/// Get the declarest config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("declarest");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("declarest"))
}

/// Get the context file path, honoring the flag and env overrides
pub fn config_file(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(expand(&path.to_string_lossy()));
    }

    if let Ok(file) = std::env::var(ENV_CONFIG) {
        let path = expand(&file);
        log::debug!("Using context file from {ENV_CONFIG}: {}", path.display());
        return Ok(path);
    }

    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables leave the input unchanged.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

/// Resolve a configured path against the directory of the context file.
pub fn resolve_from(base: &Path, path: &str) -> PathBuf {
    let expanded = expand(path);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

// ============================================================================
// Tests
// ============================================================================
