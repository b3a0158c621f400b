//! Get: an ordered pipeline of lookup strategies.

use super::Reconciler;
use crate::error::{Error, Result};
use crate::path;
use crate::record::ResourceRecord;
use crate::request::RequestSpec;
use serde_json::Value;
use std::fmt;

/// Outcome of one lookup strategy.
enum Lookup {
    Resolved(Value),
    NotApplicable,
}

/// Lookup strategies, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// GET the logical path as-is.
    Literal,
    /// Scan the parent collection for the last path segment.
    ParentCollection,
    /// Probe the metadata-computed path, falling back to an alias scan.
    Computed,
}

const PIPELINE: [Strategy; 3] = [Strategy::Literal, Strategy::ParentCollection, Strategy::Computed];

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Literal => "literal",
            Self::ParentCollection => "parent-collection",
            Self::Computed => "computed",
        };
        f.write_str(name)
    }
}

impl Reconciler {
    /// Fetch a resource, or every item of a collection as an array.
    ///
    /// Read payload transforms are applied to the result.
    pub fn get_remote_resource(&self, logical_path: &str) -> Result<Value> {
        let _op = self.operation();
        path::validate(logical_path)?;
        if path::is_collection(logical_path) {
            return self.get_remote_collection(logical_path).map(Value::Array);
        }
        let record = self.resolver.record(logical_path)?;
        let payload = record.read_payload();
        let value = self.run_pipeline(record)?;
        crate::payload::transform(&value, payload.as_ref())
    }

    /// Fetch a collection's items, filtered and transformed.
    pub fn get_remote_collection(&self, logical_path: &str) -> Result<Vec<Value>> {
        let _op = self.operation();
        let logical_path = path::as_collection(logical_path);
        let record = self.pinned_record(&logical_path)?;
        let op = record.read_operation(true);
        let items = self.fetch_collection(&record, op.as_ref())?;
        let payload = record.list_payload();
        items
            .iter()
            .map(|item| record.apply_payload(item, payload.as_ref()))
            .collect()
    }

    fn run_pipeline(&self, record: ResourceRecord) -> Result<Value> {
        for strategy in PIPELINE {
            match self.lookup(strategy, &record)? {
                Lookup::Resolved(value) => {
                    log::debug!("get {}: resolved by {strategy}", record.path);
                    return Ok(value);
                }
                Lookup::NotApplicable => log::debug!("get {}: {strategy} not applicable", record.path),
            }
        }
        Err(Error::not_found("GET", &record.path))
    }

    fn lookup(&self, strategy: Strategy, record: &ResourceRecord) -> Result<Lookup> {
        match strategy {
            Strategy::Literal => self.lookup_literal(record),
            Strategy::ParentCollection => self.lookup_in_parent(record),
            Strategy::Computed => self.lookup_computed(record).map(Lookup::Resolved),
        }
    }

    fn lookup_literal(&self, record: &ResourceRecord) -> Result<Lookup> {
        let op = record.read_operation(false);
        let spec = RequestSpec::build(record, &record.path, "", op.as_ref(), false);
        match self.server.get_resource(&spec) {
            Ok(value) => Ok(Lookup::Resolved(value)),
            Err(e) if e.is_not_found() => Ok(Lookup::NotApplicable),
            Err(e) => Err(e),
        }
    }

    fn lookup_in_parent(&self, record: &ResourceRecord) -> Result<Lookup> {
        if record.data.is_some() {
            return Ok(Lookup::NotApplicable);
        }
        let pinned = self.pin(record.clone());
        Ok(match self.find_in_collection(&pinned)? {
            Some(item) => Lookup::Resolved(item),
            None => Lookup::NotApplicable,
        })
    }

    fn lookup_computed(&self, record: &ResourceRecord) -> Result<Value> {
        let located = self.locate(self.pin(record.clone()))?;
        let op = located.record.read_operation(false);
        let spec = RequestSpec::build(
            &located.record,
            &located.remote_path,
            &located.record.path,
            op.as_ref(),
            false,
        );
        self.server.get_resource(&spec)
    }
}
