//! Collection listings shared for the length of one public operation.
//!
//! A single get or save may list the same collection several times: the
//! parent scan, its unfiltered retry, the alias lookup and the ancestor
//! scans of nested remote loads. Listings are kept while an operation runs on
//! the calling thread and dropped when its outermost call returns, so
//! parallel batch workers never see each other's listings.

use crate::request::RequestSpec;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};

#[derive(Default)]
struct Scope {
    depth: usize,
    lists: HashMap<String, Vec<Value>>,
}

#[derive(Default)]
pub(super) struct CollectionCache {
    scopes: Mutex<HashMap<ThreadId, Scope>>,
}

impl CollectionCache {
    /// Open (or re-enter) the calling thread's operation scope.
    pub fn begin(&self) -> OperationGuard<'_> {
        self.scopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(thread::current().id())
            .or_default()
            .depth += 1;
        OperationGuard { cache: self }
    }

    /// Raw items previously listed for `spec` in the current operation.
    pub fn get(&self, spec: &RequestSpec) -> Option<Vec<Value>> {
        let scopes = self.scopes.lock().unwrap_or_else(PoisonError::into_inner);
        scopes.get(&thread::current().id())?.lists.get(&key(spec)).cloned()
    }

    /// Keep `items` for the rest of the operation. No-op outside one.
    pub fn insert(&self, spec: &RequestSpec, items: &[Value]) {
        let mut scopes = self.scopes.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(scope) = scopes.get_mut(&thread::current().id()) {
            scope.lists.insert(key(spec), items.to_vec());
        }
    }

    fn end(&self) {
        let mut scopes = self.scopes.lock().unwrap_or_else(PoisonError::into_inner);
        let id = thread::current().id();
        let Some(scope) = scopes.get_mut(&id) else {
            return;
        };
        scope.depth = scope.depth.saturating_sub(1);
        if scope.depth == 0 {
            if !scope.lists.is_empty() {
                log::trace!("dropping {} cached listings", scope.lists.len());
            }
            scopes.remove(&id);
        }
    }

    #[cfg(test)]
    fn is_active(&self) -> bool {
        self.scopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&thread::current().id())
    }
}

/// Closes the operation scope on drop.
pub(super) struct OperationGuard<'a> {
    cache: &'a CollectionCache,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.cache.end();
    }
}

/// Everything that makes two listings the same request.
fn key(spec: &RequestSpec) -> String {
    format!(
        "{} {} {:?} {:?}",
        spec.method,
        spec.path_with_query(),
        spec.headers,
        spec.accept
    )
}
