//! Field-level metadata merge.
//!
//! Precedence rules:
//! - strings: a non-blank override wins
//! - lists (`secretInAttributes`, headers, query strings): a declared
//!   override replaces the base, even when empty
//! - payload config: a declared override replaces the base wholesale
//! - absent sections leave the base untouched

use super::{
    OperationInfo, OperationKind, OperationMetadata, ResourceInfo, ResourceMetadata, UrlMetadata,
};

fn choose(current: String, candidate: &str) -> String {
    if candidate.trim().is_empty() {
        current
    } else {
        candidate.to_string()
    }
}

/// Merge `overlay` on top of `base`.
pub fn merge(base: ResourceMetadata, overlay: &ResourceMetadata) -> ResourceMetadata {
    ResourceMetadata {
        resource_info: merge_info(base.resource_info, overlay.resource_info.as_ref()),
        operation_info: merge_operations(base.operation_info, overlay.operation_info.as_ref()),
    }
}

/// Fold fragments in order; later fragments are more specific.
pub fn merge_all<'a>(
    base: ResourceMetadata,
    fragments: impl IntoIterator<Item = &'a ResourceMetadata>,
) -> ResourceMetadata {
    fragments.into_iter().fold(base, merge)
}

/// Drop identity attributes from a fragment matched above the item level.
pub fn strip_identity(mut meta: ResourceMetadata) -> ResourceMetadata {
    if let Some(info) = meta.resource_info.as_mut() {
        info.id_from_attribute.clear();
        info.alias_from_attribute.clear();
    }
    meta
}

fn merge_info(base: Option<ResourceInfo>, overlay: Option<&ResourceInfo>) -> Option<ResourceInfo> {
    let Some(overlay) = overlay else {
        return base;
    };
    let base = base.unwrap_or_default();
    Some(ResourceInfo {
        id_from_attribute: choose(base.id_from_attribute, &overlay.id_from_attribute),
        alias_from_attribute: choose(base.alias_from_attribute, &overlay.alias_from_attribute),
        collection_path: choose(base.collection_path, &overlay.collection_path),
        secret_in_attributes: overlay
            .secret_in_attributes
            .clone()
            .or(base.secret_in_attributes),
    })
}

fn merge_operations(
    base: Option<OperationInfo>,
    overlay: Option<&OperationInfo>,
) -> Option<OperationInfo> {
    let Some(overlay) = overlay else {
        return base;
    };
    let mut merged = base.unwrap_or_default();
    let mut overlay = overlay.clone();
    for kind in OperationKind::ALL {
        let slot = merged.slot_mut(kind);
        let current = slot.take();
        *slot = merge_operation(current, overlay.slot_mut(kind).take());
    }
    Some(merged)
}

/// Merge a single operation spec.
pub fn merge_operation(
    base: Option<OperationMetadata>,
    overlay: Option<OperationMetadata>,
) -> Option<OperationMetadata> {
    let Some(overlay) = overlay else {
        return base;
    };
    let Some(base) = base else {
        return Some(overlay);
    };

    let url = match (base.url, overlay.url) {
        (base_url, None) => base_url,
        (None, Some(over)) => Some(over),
        (Some(base_url), Some(over)) => Some(UrlMetadata {
            path: choose(base_url.path, &over.path),
            query_strings: over.query_strings.or(base_url.query_strings),
        }),
    };

    Some(OperationMetadata {
        url,
        http_method: choose(base.http_method, &overlay.http_method),
        http_headers: overlay.http_headers.or(base.http_headers),
        payload: overlay.payload.or(base.payload),
        jq_filter: choose(base.jq_filter, &overlay.jq_filter),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{HeaderList, PayloadConfig};
    use serde_json::json;

    fn meta(value: serde_json::Value) -> ResourceMetadata {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_blank_strings_do_not_override() {
        let base = meta(json!({"resourceInfo": {"idFromAttribute": "id", "collectionPath": "/api"}}));
        let overlay = meta(json!({"resourceInfo": {"idFromAttribute": " ", "aliasFromAttribute": "name"}}));
        let merged = merge(base, &overlay);
        let info = merged.resource_info.unwrap();
        assert_eq!(info.id_from_attribute, "id");
        assert_eq!(info.alias_from_attribute, "name");
        assert_eq!(info.collection_path, "/api");
    }

    #[test]
    fn test_declared_empty_list_replaces() {
        let base = meta(json!({"resourceInfo": {"secretInAttributes": ["password"]}}));
        let overlay = meta(json!({"resourceInfo": {"secretInAttributes": []}}));
        let merged = merge(base.clone(), &overlay);
        assert!(merged.secret_attributes().is_empty());

        let untouched = merge(base, &meta(json!({"resourceInfo": {"idFromAttribute": "x"}})));
        assert_eq!(untouched.secret_attributes(), ["password".to_string()]);
    }

    #[test]
    fn test_operation_fields_merge_independently() {
        let base = meta(json!({"operationInfo": {"updateResource": {
            "httpMethod": "PUT",
            "url": {"path": "./{{.id}}", "queryStrings": ["a=1"]},
            "httpHeaders": ["X-A: 1"]
        }}}));
        let overlay = meta(json!({"operationInfo": {"updateResource": {
            "httpMethod": "PATCH",
            "url": {"queryStrings": ["b=2"]}
        }}}));
        let merged = merge(base, &overlay);
        let op = merged.operation(OperationKind::Update).unwrap();
        assert_eq!(op.http_method, "PATCH");
        let url = op.url.as_ref().unwrap();
        assert_eq!(url.path, "./{{.id}}");
        assert_eq!(url.query_strings, Some(vec!["b=2".to_string()]));
        assert_eq!(op.http_headers, Some(HeaderList(vec!["X-A: 1".to_string()])));
    }

    #[test]
    fn test_payload_replaced_wholesale() {
        let base = merge_operation(
            None,
            Some(OperationMetadata {
                payload: Some(PayloadConfig {
                    filter_attributes: vec!["a".into()],
                    suppress_attributes: vec!["b".into()],
                    jq_expression: ".".into(),
                }),
                ..Default::default()
            }),
        );
        let merged = merge_operation(
            base,
            Some(OperationMetadata {
                payload: Some(PayloadConfig {
                    suppress_attributes: vec!["c".into()],
                    ..Default::default()
                }),
                ..Default::default()
            }),
        )
        .unwrap();
        let payload = merged.payload.unwrap();
        assert!(payload.filter_attributes.is_empty());
        assert_eq!(payload.suppress_attributes, vec!["c".to_string()]);
        assert!(payload.jq_expression.is_empty());
    }

    #[test]
    fn test_strip_identity() {
        let stripped = strip_identity(meta(json!({"resourceInfo": {
            "idFromAttribute": "id",
            "aliasFromAttribute": "name",
            "collectionPath": "/x"
        }})));
        assert_eq!(stripped.id_attribute(), None);
        assert_eq!(stripped.alias_attribute(), None);
        assert_eq!(stripped.resource_info.unwrap().collection_path, "/x");
    }

    #[test]
    fn test_merge_all_order() {
        let fragments = vec![
            meta(json!({"resourceInfo": {"collectionPath": "/first"}})),
            meta(json!({"resourceInfo": {"collectionPath": "/second"}})),
        ];
        let merged = merge_all(ResourceMetadata::default(), &fragments);
        assert_eq!(merged.resource_info.unwrap().collection_path, "/second");
    }
}
