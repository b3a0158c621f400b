//! Resource metadata: the rules that map a logical path to remote identity
//! and operations.
//!
//! Metadata is declared as fragments keyed by path variants, merged from
//! least to most specific ([`merge`]), defaulted ([`defaults`], [`schema`]),
//! and rendered against a template context ([`template`]). The
//! [`MetadataResolver`] drives the whole pipeline.
//!
//! ## Fragment format
//!
//! ```json
//! {
//!   "resourceInfo": {
//!     "idFromAttribute": "id",
//!     "aliasFromAttribute": "name",
//!     "collectionPath": "/admin/realms/{{.realm}}/clients",
//!     "secretInAttributes": ["credentials.secret"]
//!   },
//!   "operationInfo": {
//!     "updateResource": { "httpMethod": "PATCH", "url": { "path": "./{{.id}}" } },
//!     "listCollection": { "jqFilter": "[.[] | select(.enabled)]" }
//!   }
//! }
//! ```

pub mod defaults;
pub mod merge;
pub mod resolver;
pub mod schema;
pub mod template;

pub use resolver::{MetadataResolver, RemoteLoader};
pub use schema::{OpenApiSchema, SchemaSource};

use serde::{Deserialize, Deserializer, Serialize};

/// Merged metadata for one logical path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_info: Option<ResourceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_info: Option<OperationInfo>,
}

impl ResourceMetadata {
    /// Identity attribute holding the remote id, if declared.
    pub fn id_attribute(&self) -> Option<&str> {
        self.resource_info
            .as_ref()
            .map(|info| info.id_from_attribute.trim())
            .filter(|s| !s.is_empty())
    }

    /// Identity attribute holding the human-friendly alias, if declared.
    pub fn alias_attribute(&self) -> Option<&str> {
        self.resource_info
            .as_ref()
            .map(|info| info.alias_from_attribute.trim())
            .filter(|s| !s.is_empty())
    }

    /// Attribute paths whose values are secrets.
    pub fn secret_attributes(&self) -> &[String] {
        self.resource_info
            .as_ref()
            .and_then(|info| info.secret_in_attributes.as_deref())
            .unwrap_or_default()
    }

    /// Declared operation of the given kind, without fallbacks.
    pub fn operation(&self, kind: OperationKind) -> Option<&OperationMetadata> {
        let info = self.operation_info.as_ref()?;
        match kind {
            OperationKind::Get => info.get_resource.as_ref(),
            OperationKind::Create => info.create_resource.as_ref(),
            OperationKind::Update => info.update_resource.as_ref(),
            OperationKind::Delete => info.delete_resource.as_ref(),
            OperationKind::List => info.list_collection.as_ref(),
        }
    }
}

/// Identity and location rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id_from_attribute: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias_from_attribute: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collection_path: String,
    /// `None` when undeclared; an empty list still overrides on merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_in_attributes: Option<Vec<String>>,
}

/// Per-operation specs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_resource: Option<OperationMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_resource: Option<OperationMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_resource: Option<OperationMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_resource: Option<OperationMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_collection: Option<OperationMetadata>,
}

impl OperationInfo {
    /// Mutable slot for the given operation kind.
    pub fn slot_mut(&mut self, kind: OperationKind) -> &mut Option<OperationMetadata> {
        match kind {
            OperationKind::Get => &mut self.get_resource,
            OperationKind::Create => &mut self.create_resource,
            OperationKind::Update => &mut self.update_resource,
            OperationKind::Delete => &mut self.delete_resource,
            OperationKind::List => &mut self.list_collection,
        }
    }
}

/// One operation: where, how, and what to send or keep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<UrlMetadata>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub http_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_headers: Option<HeaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadConfig>,
    /// List-only jq filter over the whole item array.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jq_filter: String,
}

impl OperationMetadata {
    /// Declared path template, trimmed, if any.
    pub fn path_template(&self) -> Option<&str> {
        self.url
            .as_ref()
            .map(|url| url.path.trim())
            .filter(|p| !p.is_empty())
    }

    /// Upper-cased method, defaulting to GET.
    pub fn method(&self) -> String {
        let method = self.http_method.trim();
        if method.is_empty() {
            "GET".to_string()
        } else {
            method.to_ascii_uppercase()
        }
    }

    /// Copy of this operation without its collection filter.
    pub fn without_filter(&self) -> Self {
        Self {
            jq_filter: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    /// `key=value` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_strings: Option<Vec<String>>,
}

/// Payload transform applied to outgoing and incoming bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppress_attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jq_expression: String,
}

/// Header lines in `Name: value` form.
///
/// Deserializes from either a list of lines or a list of `{name, value}`
/// entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderList(pub Vec<String>);

impl HeaderList {
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for HeaderList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Entry {
            name: String,
            value: String,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Lines(Vec<String>),
            Entries(Vec<Entry>),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Lines(lines) => HeaderList(lines),
            Wire::Entries(entries) => HeaderList(
                entries
                    .into_iter()
                    .filter(|e| !e.name.trim().is_empty() && !e.value.trim().is_empty())
                    .map(|e| format!("{}: {}", e.name.trim(), e.value.trim()))
                    .collect(),
            ),
        })
    }
}

/// The five operations a record can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Get,
    Create,
    Update,
    Delete,
    List,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Get,
        OperationKind::Create,
        OperationKind::Update,
        OperationKind::Delete,
        OperationKind::List,
    ];

    /// Method used when nothing is declared.
    pub fn default_method(&self) -> &'static str {
        match self {
            Self::Get | Self::List => "GET",
            Self::Create => "POST",
            Self::Update => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_fragment() {
        let meta: ResourceMetadata = serde_json::from_value(json!({
            "resourceInfo": {
                "idFromAttribute": "uuid",
                "secretInAttributes": []
            },
            "operationInfo": {
                "getResource": {
                    "httpMethod": "get",
                    "url": {"path": "./{{.id}}", "queryStrings": ["expand=true"]},
                    "httpHeaders": ["X-Tenant: acme"]
                }
            }
        }))
        .unwrap();

        assert_eq!(meta.id_attribute(), Some("uuid"));
        assert_eq!(meta.alias_attribute(), None);
        assert_eq!(
            meta.resource_info.as_ref().unwrap().secret_in_attributes,
            Some(vec![])
        );
        let get = meta.operation(OperationKind::Get).unwrap();
        assert_eq!(get.method(), "GET");
        assert_eq!(get.path_template(), Some("./{{.id}}"));
        assert_eq!(get.http_headers.as_ref().unwrap().0, vec!["X-Tenant: acme"]);
    }

    #[test]
    fn test_header_entries() {
        let headers: HeaderList = serde_json::from_value(json!([
            {"name": "Accept", "value": "application/xml"},
            {"name": "X-Empty", "value": ""}
        ]))
        .unwrap();
        assert_eq!(headers.0, vec!["Accept: application/xml"]);
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let meta = ResourceMetadata {
            resource_info: Some(ResourceInfo {
                id_from_attribute: "id".into(),
                ..Default::default()
            }),
            operation_info: None,
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value, json!({"resourceInfo": {"idFromAttribute": "id"}}));
    }

    #[test]
    fn test_default_methods() {
        assert_eq!(OperationKind::Create.default_method(), "POST");
        assert_eq!(OperationKind::Update.default_method(), "PUT");
        assert_eq!(OperationMetadata::default().method(), "GET");
    }
}
