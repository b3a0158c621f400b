//! Secret placeholders in resource payloads.
//!
//! A declared secret attribute may hold a placeholder instead of plaintext:
//! `{{secret .}}` keys the secret by the attribute path itself, while
//! `{{secret "key"}}` names the key explicitly. Placeholders are resolved
//! right before a write; plain values are passed through untouched.

use crate::error::{Error, Result};
use crate::payload;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

static SECRET_PLACEHOLDER: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"^\s*\{\{\s*secret\s+(?:\.|"([^"]*)")\s*\}\}\s*$"#)
        .expect("secret pattern is valid")
});

/// Backend holding plaintext secret values.
pub trait SecretStore: Send + Sync {
    /// Plaintext value of `key` for the resource at `resource_path`.
    fn get_secret(&self, resource_path: &str, key: &str) -> Result<String>;
}

/// Secret key referenced by `value`, if it is a placeholder.
pub fn placeholder_key(value: &str, attribute: &str) -> Option<String> {
    let caps = SECRET_PLACEHOLDER.captures(value)?;
    match caps.get(1) {
        Some(key) if !key.as_str().trim().is_empty() => Some(key.as_str().trim().to_string()),
        Some(_) => None,
        None => Some(attribute.to_string()),
    }
}

/// Whether any of `attributes` holds a placeholder.
pub fn has_placeholders(payload: &Value, attributes: &[String]) -> bool {
    attributes.iter().any(|attr| {
        payload::get_attr(payload, attr)
            .and_then(Value::as_str)
            .and_then(|value| placeholder_key(value, attr))
            .is_some()
    })
}

/// Replace placeholders in `attributes` with values from `store`.
pub fn resolve_placeholders(
    store: &dyn SecretStore,
    resource_path: &str,
    payload: &Value,
    attributes: &[String],
) -> Result<Value> {
    let mut resolved = payload.clone();
    let Some(obj) = resolved.as_object_mut() else {
        return Ok(resolved);
    };
    for attr in attributes {
        let key = payload::get_attr(payload, attr)
            .and_then(Value::as_str)
            .and_then(|value| placeholder_key(value, attr));
        if let Some(key) = key {
            let secret = store.get_secret(resource_path, &key)?;
            payload::set_attr(obj, attr, Value::String(secret));
        }
    }
    Ok(resolved)
}

/// Prepare a payload for transmission.
///
/// Without a store, any pending placeholder is an error rather than text sent
/// to the server.
pub fn prepare(
    store: Option<&dyn SecretStore>,
    resource_path: &str,
    payload: &Value,
    attributes: &[String],
) -> Result<Value> {
    if attributes.is_empty() {
        return Ok(payload.clone());
    }
    match store {
        Some(store) => resolve_placeholders(store, resource_path, payload, attributes),
        None if has_placeholders(payload, attributes) => Err(Error::SecretStoreNotConfigured),
        None => Ok(payload.clone()),
    }
}

/// In-memory secret store keyed by resource path and secret key.
#[derive(Debug, Clone, Default)]
pub struct MemorySecrets {
    secrets: Arc<Mutex<HashMap<(String, String), String>>>,
}

impl MemorySecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, resource_path: &str, key: &str, value: impl Into<String>) {
        if let Ok(mut secrets) = self.secrets.lock() {
            secrets.insert(
                (crate::path::normalize(resource_path), key.to_string()),
                value.into(),
            );
        }
    }

    /// Load `{"/path": {"key": "value"}}` documents.
    pub fn from_value(doc: &Value) -> Result<Self> {
        let store = Self::new();
        let Some(entries) = doc.as_object() else {
            return Err(Error::Other("secrets document must be an object".into()));
        };
        for (path, keys) in entries {
            let Some(keys) = keys.as_object() else {
                return Err(Error::Other(format!("secrets for {path} must be an object")));
            };
            for (key, value) in keys {
                let Some(value) = value.as_str() else {
                    return Err(Error::Other(format!("secret {path}:{key} must be a string")));
                };
                store.insert(path, key, value);
            }
        }
        Ok(store)
    }
}

impl SecretStore for MemorySecrets {
    fn get_secret(&self, resource_path: &str, key: &str) -> Result<String> {
        let path = crate::path::normalize(resource_path);
        let secrets = self
            .secrets
            .lock()
            .map_err(|_| Error::Other("secret store lock poisoned".into()))?;
        secrets
            .get(&(path.clone(), key.to_string()))
            .cloned()
            .ok_or(Error::SecretNotFound {
                path,
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_placeholder_key_forms() {
        assert_eq!(placeholder_key("{{secret .}}", "credentials.password").as_deref(), Some("credentials.password"));
        assert_eq!(placeholder_key(" {{ secret \"db\" }} ", "x").as_deref(), Some("db"));
        assert_eq!(placeholder_key("hunter2", "x"), None);
        assert_eq!(placeholder_key("{{secret \"\"}}", "x"), None);
        assert_eq!(placeholder_key("prefix {{secret .}}", "x"), None);
    }

    #[test]
    fn test_has_placeholders_only_checks_declared_attributes() {
        let payload = json!({"password": "{{secret .}}", "note": "{{secret .}}"});
        assert!(has_placeholders(&payload, &attrs(&["password"])));
        assert!(!has_placeholders(&payload, &attrs(&["token"])));
    }

    #[test]
    fn test_resolve_placeholders() {
        let store = MemorySecrets::new();
        store.insert("/users/alice", "credentials.password", "s3cret");
        store.insert("/users/alice", "api", "k-1");
        let payload = json!({
            "credentials": {"password": "{{secret .}}"},
            "token": "{{secret \"api\"}}",
            "plain": "visible"
        });
        let resolved = resolve_placeholders(
            &store,
            "/users/alice",
            &payload,
            &attrs(&["credentials.password", "token", "plain"]),
        )
        .unwrap();
        assert_eq!(
            resolved,
            json!({"credentials": {"password": "s3cret"}, "token": "k-1", "plain": "visible"})
        );
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let store = MemorySecrets::new();
        let err = resolve_placeholders(&store, "/a", &json!({"p": "{{secret .}}"}), &attrs(&["p"]))
            .unwrap_err();
        assert!(matches!(err, Error::SecretNotFound { .. }));
    }

    #[test]
    fn test_prepare_without_store() {
        let pending = json!({"password": "{{secret .}}"});
        let err = prepare(None, "/a", &pending, &attrs(&["password"])).unwrap_err();
        assert!(matches!(err, Error::SecretStoreNotConfigured));

        let plain = json!({"password": "already-plain"});
        assert_eq!(prepare(None, "/a", &plain, &attrs(&["password"])).unwrap(), plain);
        assert_eq!(prepare(None, "/a", &pending, &[]).unwrap(), pending);
    }

    #[test]
    fn test_memory_secrets_from_value() {
        let store = MemorySecrets::from_value(&json!({"/db/main/": {"password": "pw"}})).unwrap();
        assert_eq!(store.get_secret("/db/main", "password").unwrap(), "pw");
        assert!(MemorySecrets::from_value(&json!(["x"])).is_err());
    }
}
