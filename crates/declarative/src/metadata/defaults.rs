//! Built-in metadata, the lowest-priority layer of every resolution.

use super::{OperationInfo, OperationKind, OperationMetadata, ResourceInfo, ResourceMetadata};
use crate::headers;
use crate::path;

/// Default operation for a kind: its method and default headers, no path
/// template (the request targets the computed path as-is).
pub fn operation(kind: OperationKind) -> OperationMetadata {
    let method = kind.default_method();
    OperationMetadata {
        http_method: method.to_string(),
        http_headers: Some(headers::default_lines(method)),
        ..Default::default()
    }
}

/// Built-in metadata for a logical path.
///
/// Identity comes from the `id` attribute and the collection path mirrors
/// the logical collection segments.
pub fn builtin(logical_path: &str) -> ResourceMetadata {
    let mut collection = path::segments(logical_path);
    if !path::is_collection(logical_path) {
        collection.pop();
    }
    let collection_path = if collection.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", collection.join("/"))
    };

    let mut operations = OperationInfo::default();
    for kind in OperationKind::ALL {
        *operations.slot_mut(kind) = Some(operation(kind));
    }

    ResourceMetadata {
        resource_info: Some(ResourceInfo {
            id_from_attribute: "id".to_string(),
            alias_from_attribute: "id".to_string(),
            collection_path,
            secret_in_attributes: None,
        }),
        operation_info: Some(operations),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_for_item() {
        let meta = builtin("/teams/core/members/ana");
        let info = meta.resource_info.as_ref().unwrap();
        assert_eq!(info.collection_path, "/teams/core/members");
        assert_eq!(meta.id_attribute(), Some("id"));
        assert_eq!(meta.alias_attribute(), Some("id"));
    }

    #[test]
    fn test_builtin_for_collection() {
        let meta = builtin("/teams/");
        assert_eq!(meta.resource_info.unwrap().collection_path, "/teams");
        assert_eq!(builtin("/ana").resource_info.unwrap().collection_path, "/");
    }

    #[test]
    fn test_builtin_methods_and_headers() {
        let meta = builtin("/a/b");
        let create = meta.operation(OperationKind::Create).unwrap();
        assert_eq!(create.http_method, "POST");
        assert_eq!(create.http_headers.as_ref().unwrap().0.len(), 2);
        let list = meta.operation(OperationKind::List).unwrap();
        assert_eq!(list.http_method, "GET");
        assert!(list.path_template().is_none());
    }
}
