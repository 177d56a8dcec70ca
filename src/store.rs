//! Shared document store.
//!
//! A concurrent mapping from pipeline name (case-insensitive) to that
//! pipeline's most recent process-phase output. Written exactly once per run
//! by each non-isolated process phase; read by transform- and output-phase
//! modules. The transform barrier guarantees every transform reader observes
//! the final process output of every non-isolated pipeline.

use crate::document::Documents;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct DocumentStore {
    inner: DashMap<String, Documents>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a pipeline's process output, overwriting any prior value.
    pub fn publish(&self, pipeline: &str, documents: Documents) {
        self.inner.insert(pipeline.to_lowercase(), documents);
    }

    /// The published output of a pipeline, if its process phase succeeded
    /// this run.
    pub fn get(&self, pipeline: &str) -> Option<Documents> {
        self.inner
            .get(&pipeline.to_lowercase())
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, pipeline: &str) -> bool {
        self.inner.contains_key(&pipeline.to_lowercase())
    }

    /// Names of all pipelines with published output, folded to lowercase.
    pub fn names(&self) -> Vec<String> {
        self.inner.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop all published output. Called at the start of every run.
    pub fn clear(&self) {
        self.inner.clear();
    }
}
