//! Blocking HTTP resource server.
//!
//! Thin transport over a `ureq` agent: every [`RequestSpec`] becomes one
//! call against `base_url + spec.path`. Authentication is limited to static
//! headers; anything more belongs in front of this adapter.

use super::ResourceServer;
use crate::error::{Error, Result};
use crate::request::RequestSpec;
use serde_json::Value;

/// Envelope keys probed when a list endpoint wraps its items in an object.
const COLLECTION_KEYS: &[&str] = &["items", "data", "results", "content"];

/// REST server reached over HTTP(S).
pub struct HttpResourceServer {
    agent: ureq::Agent,
    base_url: String,
    headers: Vec<(String, String)>,
}

impl HttpResourceServer {
    /// Create a server rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers: Vec::new(),
        }
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, remote_path: &str) -> String {
        if remote_path.starts_with('/') {
            format!("{}{}", self.base_url, remote_path)
        } else {
            format!("{}/{}", self.base_url, remote_path)
        }
    }

    fn decorate<B>(&self, mut req: ureq::RequestBuilder<B>, spec: &RequestSpec) -> ureq::RequestBuilder<B> {
        for (name, value) in &self.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        for (name, values) in &spec.headers {
            for value in values {
                req = req.header(name.as_str(), value.as_str());
            }
        }
        if let Some(accept) = &spec.accept {
            req = req.header("Accept", accept.as_str());
        }
        for (key, values) in &spec.query {
            for value in values {
                req = req.query(key, value);
            }
        }
        req
    }

    fn classify(err: ureq::Error, spec: &RequestSpec) -> Error {
        match err {
            ureq::Error::StatusCode(404) => Error::not_found(&spec.method, &spec.path),
            ureq::Error::StatusCode(409) => Error::conflict(&spec.method, &spec.path),
            other => other.into(),
        }
    }

    fn execute(&self, spec: &RequestSpec, payload: Option<&Value>) -> Result<Value> {
        let url = self.url_for(&spec.path);
        let method = spec.method.to_ascii_uppercase();
        log::debug!("{method} {url}");

        let result = match method.as_str() {
            "GET" => self.decorate(self.agent.get(&url), spec).call(),
            "DELETE" => self.decorate(self.agent.delete(&url), spec).call(),
            "POST" | "PUT" | "PATCH" => {
                let req = match method.as_str() {
                    "POST" => self.agent.post(&url),
                    "PUT" => self.agent.put(&url),
                    _ => self.agent.patch(&url),
                };
                let req = self.decorate(req, spec);
                match payload {
                    Some(payload) => {
                        let content_type = spec.content_type.as_deref().unwrap_or("application/json");
                        let body = serde_json::to_vec(payload)?;
                        req.header("Content-Type", content_type).send(&body[..])
                    }
                    None => req.send_empty(),
                }
            }
            other => return Err(Error::Other(format!("unsupported HTTP method {other}"))),
        };

        let mut response = result.map_err(|e| Self::classify(e, spec))?;
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Self::classify(e, spec))?;
        parse_body(&body)
    }
}

fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| Error::InvalidResponse(e.to_string()))
}

/// Items of a list response: a bare array, or an array under a common
/// envelope key.
fn collection_items(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        Value::Object(mut obj) => COLLECTION_KEYS
            .iter()
            .find_map(|key| match obj.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| Error::InvalidResponse("collection response is not a list".into())),
        _ => Err(Error::InvalidResponse(
            "collection response is not a list".into(),
        )),
    }
}

impl ResourceServer for HttpResourceServer {
    fn get_resource(&self, spec: &RequestSpec) -> Result<Value> {
        self.execute(spec, None)
    }

    fn get_collection(&self, spec: &RequestSpec) -> Result<Vec<Value>> {
        collection_items(self.execute(spec, None)?)
    }

    fn create_resource(&self, payload: &Value, spec: &RequestSpec) -> Result<Value> {
        self.execute(spec, Some(payload))
    }

    fn update_resource(&self, payload: &Value, spec: &RequestSpec) -> Result<Value> {
        self.execute(spec, Some(payload))
    }

    fn delete_resource(&self, spec: &RequestSpec) -> Result<()> {
        self.execute(spec, None).map(|_| ())
    }
}
