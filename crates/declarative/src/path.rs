//! Logical path helpers.
//!
//! Logical paths are absolute and slash-separated. A trailing slash marks a
//! collection; everything else addresses a single resource. The wildcard
//! segment [`WILDCARD`] only appears in metadata lookup keys.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Reserved segment that matches any literal in metadata lookup.
pub const WILDCARD: &str = "_";

/// Split a path into its non-empty segments.
pub fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Normalize a path to `/a/b` form, dropping empty segments and any
/// trailing slash. The root normalizes to `/`.
pub fn normalize(path: &str) -> String {
    let segs = segments(path);
    if segs.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segs.join("/"))
}

/// Whether the path addresses a collection.
pub fn is_collection(path: &str) -> bool {
    let trimmed = path.trim();
    trimmed.is_empty() || trimmed.ends_with('/')
}

/// Normalize a path into collection form (`/a/b/`, or `/` for the root).
pub fn as_collection(path: &str) -> String {
    let normalized = normalize(path);
    if normalized == "/" {
        normalized
    } else {
        format!("{normalized}/")
    }
}

/// Last segment of a path, or an empty string for the root.
pub fn last_segment(path: &str) -> String {
    segments(path).pop().unwrap_or_default()
}

/// Parent of a normalized path. The parent of a top-level item is `/`.
pub fn parent(path: &str) -> String {
    let mut segs = segments(path);
    segs.pop();
    if segs.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segs.join("/"))
    }
}

/// Join a base path and a single segment.
pub fn join(base: &str, segment: &str) -> String {
    let base = normalize(base);
    if base == "/" {
        normalize(&format!("/{segment}"))
    } else {
        normalize(&format!("{base}/{segment}"))
    }
}

/// Prefix paths `/a`, `/a/b`, ... for every segment of `path`.
pub fn prefixes(path: &str) -> Vec<String> {
    let segs = segments(path);
    (1..=segs.len())
        .map(|depth| format!("/{}", segs[..depth].join("/")))
        .collect()
}

/// Make a remote identifier safe to embed as one path segment.
pub fn sanitize_segment(value: &str) -> String {
    value.trim().replace(['/', '\\'], "-")
}

/// Reject paths that cannot address a live resource.
pub fn validate(path: &str) -> Result<()> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_path(path, "path is empty"));
    }
    if !trimmed.starts_with('/') {
        return Err(Error::invalid_path(path, "path must be absolute"));
    }
    if trimmed.contains('\\') {
        return Err(Error::invalid_path(path, "backslashes are not allowed"));
    }
    for segment in trimmed.split('/').map(str::trim) {
        match segment {
            WILDCARD => {
                return Err(Error::invalid_path(
                    path,
                    "the wildcard segment is reserved for metadata",
                ));
            }
            "." | ".." => {
                return Err(Error::invalid_path(path, "relative segments are not allowed"));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Every combination of literal vs wildcard for the given segments, paired
/// with its wildcard count. The all-literal variant comes first.
pub fn wildcard_variants(segs: &[String]) -> Vec<(Vec<String>, usize)> {
    let n = segs.len();
    let mut variants = Vec::with_capacity(1 << n);
    for mask in 0..(1usize << n) {
        let mut variant = Vec::with_capacity(n);
        let mut wildcards = 0;
        for (i, seg) in segs.iter().enumerate() {
            if mask & (1 << i) != 0 || seg == WILDCARD {
                variant.push(WILDCARD.to_string());
                wildcards += 1;
            } else {
                variant.push(seg.clone());
            }
        }
        variants.push((variant, wildcards));
    }
    variants
}

/// Replace whole segments of `path` using the `literal -> remote id` map.
/// Blank replacement values are ignored.
pub fn replace_segments(path: &str, replacements: &HashMap<String, String>) -> String {
    if replacements.is_empty() {
        return path.to_string();
    }
    let raw = path.trim();
    if raw.is_empty() {
        return path.to_string();
    }
    let absolute = raw.starts_with('/');
    let replaced: Vec<String> = segments(raw)
        .into_iter()
        .map(|seg| match replacements.get(&seg) {
            Some(value) if !value.trim().is_empty() => value.clone(),
            _ => seg,
        })
        .collect();
    if absolute {
        normalize(&format!("/{}", replaced.join("/")))
    } else {
        replaced.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("a//b/"), "/a/b");
        assert_eq!(normalize(" /a/b "), "/a/b");
    }

    #[test]
    fn test_is_collection() {
        assert!(is_collection("/"));
        assert!(is_collection("/users/"));
        assert!(!is_collection("/users/alice"));
    }

    #[test]
    fn test_as_collection() {
        assert_eq!(as_collection("/users"), "/users/");
        assert_eq!(as_collection("/users/"), "/users/");
        assert_eq!(as_collection("/"), "/");
    }

    #[test]
    fn test_parent_and_last_segment() {
        assert_eq!(parent("/a/b/c"), "/a/b");
        assert_eq!(parent("/a"), "/");
        assert_eq!(last_segment("/a/b/"), "b");
        assert_eq!(last_segment("/"), "");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/", "a"), "/a");
        assert_eq!(join("/api/users/", "42"), "/api/users/42");
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(prefixes("/a/b/c"), vec!["/a", "/a/b", "/a/b/c"]);
        assert!(prefixes("/").is_empty());
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("a/b\\c"), "a-b-c");
        assert_eq!(sanitize_segment(" 42 "), "42");
    }

    #[test]
    fn test_validate_rejects_reserved_segments() {
        assert!(validate("/users/alice").is_ok());
        assert!(validate("/users/").is_ok());
        assert!(validate("/users/_").is_err());
        assert!(validate("/users/../etc").is_err());
        assert!(validate("users").is_err());
        assert!(validate("/a\\b").is_err());
        assert!(validate("").is_err());
    }

    #[test]
    fn test_wildcard_variants() {
        let segs = vec!["a".to_string(), "b".to_string()];
        let variants = wildcard_variants(&segs);
        assert_eq!(variants.len(), 4);
        assert_eq!(variants[0], (vec!["a".to_string(), "b".to_string()], 0));
        assert!(variants.contains(&(vec!["_".to_string(), "_".to_string()], 2)));
        assert!(variants.contains(&(vec!["a".to_string(), "_".to_string()], 1)));
    }

    #[test]
    fn test_replace_segments() {
        let mut replacements = HashMap::new();
        replacements.insert("master".to_string(), "7f3a".to_string());
        replacements.insert("blank".to_string(), " ".to_string());
        assert_eq!(
            replace_segments("/realms/master/clients", &replacements),
            "/realms/7f3a/clients"
        );
        assert_eq!(replace_segments("/realms/blank", &replacements), "/realms/blank");
        assert_eq!(replace_segments("master/x", &replacements), "7f3a/x");
    }
}
