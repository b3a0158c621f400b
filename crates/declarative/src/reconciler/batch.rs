//! Parallel batch save.

use super::{Reconciler, SaveOutcome};
use crate::error::{Error, Result};
use rayon::prelude::*;
use serde_json::Value;

/// A resource that failed to save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFailure {
    pub path: String,
    pub error: String,
}

/// Outcome counts of a batch save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub created: usize,
    pub updated: usize,
    pub failed: Vec<SaveFailure>,
}

impl SaveSummary {
    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.updated + self.failed.len()
    }

    /// Check if every save succeeded
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, path: &str, result: &Result<SaveOutcome>) {
        match result {
            Ok(SaveOutcome::Created(_)) => self.created += 1,
            Ok(SaveOutcome::Updated(_)) => self.updated += 1,
            Err(e) => self.failed.push(SaveFailure {
                path: path.to_string(),
                error: e.to_string(),
            }),
        }
    }
}

impl Reconciler {
    /// Save several resources, `jobs` at a time.
    ///
    /// Individual failures are collected in the summary; only failing to set
    /// up the worker pool is an error. Results keep input order.
    pub fn save_many(&self, items: &[(String, Value)], jobs: usize) -> Result<SaveSummary> {
        let results: Vec<Result<SaveOutcome>> = if jobs <= 1 || items.len() <= 1 {
            items
                .iter()
                .map(|(path, payload)| self.save_remote_resource(path, payload))
                .collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| Error::Other(format!("failed to create thread pool: {e}")))?;
            pool.install(|| {
                items
                    .par_iter()
                    .map(|(path, payload)| self.save_remote_resource(path, payload))
                    .collect()
            })
        };

        let mut summary = SaveSummary::default();
        for ((path, _), result) in items.iter().zip(&results) {
            if let Err(e) = result {
                log::warn!("save {path} failed: {e}");
            }
            summary.add_result(path, result);
        }
        Ok(summary)
    }
}
