//! Batch input documents and batch planning.
//!
//! A batch document is a JSON object mapping integer job ids to parameter
//! objects. It is written once when a sweep is prepared and read back by
//! every node that runs a slice of it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::job::{Job, JobId, ParameterSet};

/// Mapping from job id to parameters, persisted as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchDocument {
    entries: BTreeMap<JobId, ParameterSet>,
}

impl BatchDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<JobId>, parameters: ParameterSet) {
        self.entries.insert(id.into(), parameters);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: JobId) -> Option<&ParameterSet> {
        self.entries.get(&id)
    }

    /// All jobs, ordered by id.
    #[must_use]
    pub fn jobs(&self) -> Vec<Job> {
        self.entries
            .iter()
            .map(|(id, params)| Job::new(*id, params.clone()))
            .collect()
    }

    /// Jobs with ids in `[start, start + count)`. Every id in the range must
    /// be present.
    pub fn select_range(&self, start: u64, count: u64) -> Result<Vec<Job>, SimError> {
        let end = start
            .checked_add(count)
            .ok_or_else(|| SimError::Config(format!("range {start}+{count} overflows")))?;
        (start..end)
            .map(|raw| {
                let id = JobId(raw);
                self.get(id)
                    .map(|params| Job::new(id, params.clone()))
                    .ok_or_else(|| SimError::Config(format!("job {id} not in batch document")))
            })
            .collect()
    }

    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SimError> {
        serde_json::from_str(text).map_err(|e| SimError::Serialization(e.to_string()))
    }

    /// Render the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SimError> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::Serialization(e.to_string()))
    }

    /// Load a document from disk.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        Self::from_json(&text)
    }

    /// Save a document to disk.
    pub fn save(&self, path: &Path) -> Result<(), SimError> {
        std::fs::write(path, self.to_json()?).map_err(|e| SimError::io(path, e))
    }
}

/// Split jobs into `n_batches` contiguous chunks of at most
/// `ceil(len / n_batches)` jobs. Trailing chunks may be shorter; no chunk is
/// empty.
pub fn split_batches(jobs: Vec<Job>, n_batches: usize) -> Result<Vec<Vec<Job>>, SimError> {
    if n_batches == 0 {
        return Err(SimError::Config("batch count must be at least 1".into()));
    }
    if jobs.is_empty() {
        return Ok(Vec::new());
    }
    let size = jobs.len().div_ceil(n_batches);
    let mut batches = Vec::with_capacity(n_batches);
    let mut rest = jobs.into_iter().peekable();
    while rest.peek().is_some() {
        batches.push(rest.by_ref().take(size).collect());
    }
    Ok(batches)
}

/// File name for one batch's serialized results: the id range it covers
/// (end exclusive) plus node and batch indices for traceability.
#[must_use]
pub fn output_file_name(first: u64, end: u64, node: u32, batch: usize) -> String {
    format!("simulation_{first}_{end}_n{node}_b{batch}.msgpack")
}
