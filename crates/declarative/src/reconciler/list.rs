//! Listing and inspection.

use super::Reconciler;
use crate::error::Result;
use crate::metadata::ResourceMetadata;
use crate::path;
use crate::record::ResourceRecord;
use serde::Serialize;
use std::collections::BTreeSet;

/// One remote item of a listed collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    /// Remote path of the item.
    pub path: String,
    pub id: Option<String>,
    pub alias: Option<String>,
    /// Local path the item maps to when named by its alias.
    pub alias_path: String,
}

impl Reconciler {
    /// List a collection with each item's remote path and identity, sorted
    /// by alias path.
    pub fn list_remote_resource_entries(&self, collection_path: &str) -> Result<Vec<RemoteEntry>> {
        let _op = self.operation();
        let logical = path::as_collection(collection_path);
        let record = self.pinned_record(&logical)?;
        let items = self.fetch_collection(&record, record.read_operation(true).as_ref())?;
        let mut entries: Vec<RemoteEntry> = items
            .iter()
            .map(|item| RemoteEntry {
                path: record.remote_resource_path(Some(item)),
                id: record.id_value(Some(item)),
                alias: record.alias_value(Some(item)),
                alias_path: record.alias_path(Some(item)),
            })
            .collect();
        entries.sort_by(|a, b| a.alias_path.cmp(&b.alias_path));
        Ok(entries)
    }

    /// Remote paths of a collection's items.
    pub fn list_remote_resource_paths(&self, collection_path: &str) -> Result<Vec<String>> {
        Ok(self
            .list_remote_resource_entries(collection_path)?
            .into_iter()
            .map(|entry| entry.path)
            .collect())
    }

    /// Remote paths of every collection holding a local resource.
    pub fn list_remote_resource_paths_from_local(&self) -> Result<Vec<String>> {
        let _op = self.operation();
        let collections: BTreeSet<String> = self
            .local
            .list_resource_paths()?
            .iter()
            .map(|p| path::as_collection(&path::parent(p)))
            .collect();
        let mut paths = BTreeSet::new();
        for collection in collections {
            paths.extend(self.list_remote_resource_paths(&collection)?);
        }
        Ok(paths.into_iter().collect())
    }

    /// Remote path a logical path maps to: the collection path for
    /// collections, the item path otherwise.
    pub fn get_remote_resource_path(&self, logical_path: &str) -> Result<String> {
        let _op = self.operation();
        let record = self.pinned_record(logical_path)?;
        if record.is_collection() {
            return Ok(record.collection_path());
        }
        Ok(record.remote_resource_path(record.data.as_ref()))
    }

    /// Remote collection path of a logical path.
    pub fn get_remote_collection_path(&self, logical_path: &str) -> Result<String> {
        let _op = self.operation();
        Ok(self.pinned_record(logical_path)?.collection_path())
    }

    /// Rendered metadata plus local data, for inspection.
    pub fn get_resource_record(&self, logical_path: &str) -> Result<ResourceRecord> {
        let _op = self.operation();
        self.resolver.record(logical_path)
    }

    /// Merged, unrendered metadata, for inspection.
    pub fn get_merged_metadata(&self, logical_path: &str) -> Result<ResourceMetadata> {
        self.resolver.merged(logical_path)
    }

    /// Attribute paths declared as secrets for a path.
    pub fn secret_paths_for(&self, logical_path: &str) -> Result<Vec<String>> {
        let _op = self.operation();
        Ok(self
            .resolver
            .resolve(logical_path)?
            .secret_attributes()
            .to_vec())
    }
}
