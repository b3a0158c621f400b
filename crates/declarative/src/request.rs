//! Request specs: the transport-neutral description of one remote call.

use crate::headers::HeaderMap;
use crate::metadata::OperationMetadata;
use crate::record::ResourceRecord;
use std::collections::BTreeMap;
use std::fmt;

/// Method, path, query and headers of a single remote request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, Vec<String>>,
    /// Headers other than `Accept` and `Content-Type`.
    pub headers: HeaderMap,
    pub accept: Option<String>,
    pub content_type: Option<String>,
}

impl RequestSpec {
    /// Build the request for `op` against `record`.
    ///
    /// `target_path` is used literally unless the operation declares a path
    /// template and `logical_path` is non-empty, in which case the template
    /// is rendered against the record.
    pub fn build(
        record: &ResourceRecord,
        target_path: &str,
        logical_path: &str,
        op: Option<&OperationMetadata>,
        is_collection: bool,
    ) -> Self {
        let method = op.map_or_else(|| "GET".to_string(), OperationMetadata::method);

        let mut path = target_path.to_string();
        if !logical_path.trim().is_empty()
            && let Some(rendered) = record.resolve_operation_path(logical_path, op, is_collection)
        {
            path = rendered;
        }

        let header_path = if logical_path.trim().is_empty() {
            target_path
        } else {
            logical_path
        };
        let mut headers = record.headers_for(op, header_path, is_collection);
        let accept = headers
            .remove("Accept")
            .filter(|values| !values.is_empty())
            .map(|values| values.join(", "));
        let content_type = headers
            .remove("Content-Type")
            .and_then(|values| values.into_iter().next());

        let spec = Self {
            method,
            path,
            query: record.query_for(op),
            headers,
            accept,
            content_type,
        };
        log::trace!("request spec: {spec}");
        spec
    }

    /// Path with its query string appended, as sent on the wire.
    pub fn path_with_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| format!("{key}={v}")))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

impl fmt::Display for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path_with_query())
    }
}
