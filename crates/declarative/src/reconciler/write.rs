//! Create, update, delete and save.

use super::Reconciler;
use crate::error::{Error, Result};
use crate::metadata::OperationMetadata;
use crate::payload;
use crate::record::ResourceRecord;
use crate::request::RequestSpec;
use crate::secrets;
use serde_json::Value;

/// What a save did on the server.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created(Value),
    Updated(Value),
}

impl SaveOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// Server representation returned by the write.
    pub fn value(&self) -> &Value {
        match self {
            Self::Created(value) | Self::Updated(value) => value,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Created(value) | Self::Updated(value) => value,
        }
    }
}

impl Reconciler {
    /// Create a resource in its remote collection.
    ///
    /// A conflict triggers an alias lookup; when the alias is taken by an
    /// existing item, that item is updated instead. Otherwise the conflict
    /// is returned.
    pub fn create_remote_resource(&self, logical_path: &str, payload: &Value) -> Result<Value> {
        let _op = self.operation();
        let record = self.pinned_record_with(logical_path, payload)?;
        self.create_with(record, payload)
    }

    /// Update an existing resource. Never creates.
    pub fn update_remote_resource(&self, logical_path: &str, payload: &Value) -> Result<Value> {
        let _op = self.operation();
        let record = self.pinned_record_with(logical_path, payload)?;
        let located = self.locate(record)?;
        if !located.exists {
            let method = located
                .record
                .update_operation()
                .map_or_else(|| "PUT".to_string(), |op| op.method());
            return Err(Error::not_found(method, located.remote_path));
        }
        self.update_at(&located.record, &located.remote_path, payload)
    }

    /// Delete a resource. Absent resources are not an error.
    pub fn delete_remote_resource(&self, logical_path: &str) -> Result<()> {
        let _op = self.operation();
        let record = self.pinned_record(logical_path)?;
        let remote_path = record.remote_resource_path(record.data.as_ref());
        let op = record.delete_operation();
        let spec = RequestSpec::build(&record, &remote_path, &record.path, op.as_ref(), false);
        match self.server.delete_resource(&spec) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_not_found() => log::debug!("delete {}: {e}", record.path),
            Err(e) => return Err(e),
        }

        let Some((alias_path, item)) = self.find_by_alias(&record)? else {
            log::debug!("delete {}: already absent", record.path);
            return Ok(());
        };
        let record = record.with_data(Some(item));
        let spec = RequestSpec::build(&record, &alias_path, &record.path, op.as_ref(), false);
        match self.server.delete_resource(&spec) {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }

    /// Update when the resource exists, create otherwise.
    pub fn save_remote_resource(&self, logical_path: &str, payload: &Value) -> Result<SaveOutcome> {
        let _op = self.operation();
        let record = self.pinned_record_with(logical_path, payload)?;
        let located = self.locate(record)?;
        if located.exists {
            match self.update_at(&located.record, &located.remote_path, payload) {
                Ok(value) => return Ok(SaveOutcome::Updated(value)),
                Err(e) if e.is_not_found() => {
                    log::debug!("save {logical_path}: update target vanished, creating");
                }
                Err(e) => return Err(e),
            }
        }
        let record = located.record.with_data(Some(payload.clone()));
        self.create_with(record, payload).map(SaveOutcome::Created)
    }

    fn create_with(&self, record: ResourceRecord, payload: &Value) -> Result<Value> {
        let op = record.create_operation();
        let body = self.outgoing(&record, payload, op.as_ref())?;
        let collection = record.collection_path();
        let spec = RequestSpec::build(&record, &collection, &record.path, op.as_ref(), true);
        let conflict = match self.server.create_resource(&body, &spec) {
            Err(e) if e.is_conflict() => e,
            other => return other,
        };

        let Some((remote_path, item)) = self.find_by_alias(&record)? else {
            return Err(conflict);
        };
        log::debug!("create {}: conflict, updating {remote_path}", record.path);
        self.update_at(&record.with_data(Some(item)), &remote_path, payload)
    }

    fn update_at(&self, record: &ResourceRecord, remote_path: &str, payload: &Value) -> Result<Value> {
        let op = record.update_operation();
        let body = self.outgoing(record, payload, op.as_ref())?;
        let spec = RequestSpec::build(record, remote_path, &record.path, op.as_ref(), false);
        self.server.update_resource(&body, &spec)
    }

    /// Resolve secrets, then apply the operation's payload transform.
    fn outgoing(&self, record: &ResourceRecord, body: &Value, op: Option<&OperationMetadata>) -> Result<Value> {
        let resolved = secrets::prepare(
            self.secrets.as_deref(),
            &record.path,
            body,
            record.metadata.secret_attributes(),
        )?;
        payload::transform(&resolved, op.and_then(|op| op.payload.as_ref()))
    }
}
