//! Remote identity resolution: ancestor replacement, collection scans and
//! alias lookup.

use super::Reconciler;
use crate::error::{Error, Result};
use crate::filter;
use crate::metadata::OperationMetadata;
use crate::path;
use crate::record::ResourceRecord;
use crate::request::RequestSpec;
use serde_json::Value;
use std::collections::HashMap;

/// A record whose remote location was probed.
pub(super) struct Located {
    pub record: ResourceRecord,
    pub remote_path: String,
    pub exists: bool,
}

impl Reconciler {
    /// Map each ancestor segment's literal text to its remote id.
    ///
    /// Ancestors with local data use the id computed from it. Without local
    /// data, the parent collection is scanned, but only when the ancestor's
    /// alias differs from its id; scan failures are ignored. Unresolved
    /// segments stay literal.
    pub(super) fn ancestor_replacements(&self, logical_path: &str) -> HashMap<String, String> {
        let mut prefixes = path::prefixes(logical_path);
        if !path::is_collection(logical_path) {
            prefixes.pop();
        }

        let mut replacements = HashMap::new();
        for prefix in prefixes {
            let segment = path::last_segment(&prefix);
            let record = match self.resolver.record(&prefix) {
                Ok(record) => record,
                Err(e) => {
                    log::debug!("no record for ancestor {prefix}: {e}");
                    continue;
                }
            };
            let id = if record.data.is_some() {
                record.id_value(record.data.as_ref())
            } else if record.metadata.alias_attribute() != record.metadata.id_attribute() {
                let pinned = self.pin(record.clone());
                match self.find_in_collection(&pinned) {
                    Ok(found) => found.and_then(|item| record.id_value(Some(&item))),
                    Err(e) => {
                        log::debug!("ancestor scan for {prefix} failed: {e}");
                        None
                    }
                }
            } else {
                None
            };
            if let Some(id) = id.map(|id| path::sanitize_segment(&id))
                && !id.is_empty()
                && id != segment
            {
                log::debug!("ancestor {prefix}: {segment} -> {id}");
                replacements.insert(segment, id);
            }
        }
        replacements
    }

    /// Pin the record's collection path with ancestor replacements applied.
    pub(super) fn pin(&self, record: ResourceRecord) -> ResourceRecord {
        let replacements = self.ancestor_replacements(&record.path);
        let collection = path::replace_segments(&record.collection_path(), &replacements);
        record.with_collection_path(collection)
    }

    /// List the record's (pinned) collection and apply `op`'s filter.
    ///
    /// Raw listings are reused for the rest of the current operation, so a
    /// retry with a different filter does not list again.
    pub(super) fn fetch_collection(
        &self,
        record: &ResourceRecord,
        op: Option<&OperationMetadata>,
    ) -> Result<Vec<Value>> {
        let collection = record.collection_path();
        let spec = RequestSpec::build(record, &collection, &record.path, op, true);
        let items = if let Some(items) = self.collections.get(&spec) {
            log::trace!("reusing listing of {spec}");
            items
        } else {
            let items = self.server.get_collection(&spec)?;
            self.collections.insert(&spec, &items);
            items
        };
        filter::apply(op, items)
    }

    /// Scan the parent collection for an item whose id, then alias, equals
    /// the last path segment. Retries once without the list filter.
    pub(super) fn find_in_collection(&self, record: &ResourceRecord) -> Result<Option<Value>> {
        let segment = path::last_segment(&record.path);
        let op = record.read_operation(true);

        let items = match self.fetch_collection(record, op.as_ref()) {
            Ok(items) => items,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        if let Some(found) = match_segment(record, items, &segment) {
            return Ok(Some(found));
        }

        let Some(op) = op.filter(|op| !op.jq_filter.trim().is_empty()) else {
            return Ok(None);
        };
        log::debug!("no match for {segment} in filtered list, retrying unfiltered");
        let unfiltered = op.without_filter();
        let items = match self.fetch_collection(record, Some(&unfiltered)) {
            Ok(items) => items,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match_segment(record, items, &segment))
    }

    /// Find the remote item sharing the record's alias.
    ///
    /// The desired alias comes from the record data, falling back to the last
    /// path segment. Returns the item's remote path and payload. A missing
    /// collection counts as no match.
    pub(super) fn find_by_alias(&self, record: &ResourceRecord) -> Result<Option<(String, Value)>> {
        let desired = path::last_segment(&record.alias_path(record.data.as_ref()));
        if desired.is_empty() {
            return Ok(None);
        }
        let items = match self.fetch_collection(record, record.read_operation(true).as_ref()) {
            Ok(items) => items,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        let found = items.into_iter().find(|item| {
            record
                .alias_value(Some(item))
                .is_some_and(|alias| path::sanitize_segment(&alias) == desired)
        });
        Ok(found.map(|item| {
            let remote = record.remote_resource_path(Some(&item));
            log::debug!("alias {desired} of {} found at {remote}", record.path);
            (remote, item)
        }))
    }

    /// Probe the computed remote path, then fall back to an alias scan.
    ///
    /// When the alias scan finds the item, the record data is rebased on it.
    pub(super) fn locate(&self, record: ResourceRecord) -> Result<Located> {
        let remote_path = record.remote_resource_path(record.data.as_ref());
        let op = record.read_operation(false);
        let spec = RequestSpec::build(&record, &remote_path, &record.path, op.as_ref(), false);
        if self.server.resource_exists(&spec)? {
            return Ok(Located {
                record,
                remote_path,
                exists: true,
            });
        }
        if let Some((alias_path, item)) = self.find_by_alias(&record)? {
            return Ok(Located {
                record: record.with_data(Some(item)),
                remote_path: alias_path,
                exists: true,
            });
        }
        Ok(Located {
            record,
            remote_path,
            exists: false,
        })
    }

    /// Record for a live logical path, with local data and pinned collection.
    pub(super) fn pinned_record(&self, logical_path: &str) -> Result<ResourceRecord> {
        path::validate(logical_path)?;
        let record = self.resolver.record(logical_path)?;
        Ok(self.pin(record))
    }

    /// Like [`Self::pinned_record`], with `payload` as the record data.
    pub(super) fn pinned_record_with(&self, logical_path: &str, payload: &Value) -> Result<ResourceRecord> {
        path::validate(logical_path)?;
        if path::is_collection(logical_path) {
            return Err(Error::invalid_path(
                logical_path,
                "writes need a resource path, not a collection",
            ));
        }
        let record = self
            .resolver
            .record(logical_path)?
            .with_data(Some(payload.clone()));
        Ok(self.pin(record))
    }
}

fn match_segment(record: &ResourceRecord, items: Vec<Value>, segment: &str) -> Option<Value> {
    let matches = |value: Option<String>| value.is_some_and(|v| path::sanitize_segment(&v) == segment);
    if let Some(pos) = items.iter().position(|item| matches(record.id_value(Some(item)))) {
        return items.into_iter().nth(pos);
    }
    items
        .into_iter()
        .find(|item| matches(record.alias_value(Some(item))))
}
