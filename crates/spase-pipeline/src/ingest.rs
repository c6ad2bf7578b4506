//! Ingest: repair, annotate, insert

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{info, warn};

use crate::annotate::annotate_types;
use crate::pipeline::{RepairOutcome, RepairPipeline};
use crate::store::DocumentStore;
use crate::{Error, Result};

/// What an accepted record turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReceipt {
    pub id: String,
    pub iterations: usize,
    pub rule_counts: BTreeMap<String, usize>,
}

/// Feeds records through a [`RepairPipeline`] into a [`DocumentStore`]
pub struct Ingestor<S: DocumentStore> {
    pipeline: RepairPipeline,
    store: S,
}

impl<S: DocumentStore> Ingestor<S> {
    pub fn new(pipeline: RepairPipeline, store: S) -> Self {
        Self { pipeline, store }
    }

    /// Repair `document` and, only if it ends up valid, annotate it and
    /// insert it as `class`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unrepairable`] with the remaining issues when the
    /// record does not converge, or [`Error::Store`] if the insert fails.
    pub fn ingest(&mut self, document: Value, class: &str) -> Result<IngestReceipt> {
        let run = self.pipeline.run(document)?;

        match run.outcome {
            RepairOutcome::Valid => {}
            RepairOutcome::Unrepairable { remaining } | RepairOutcome::IterationLimit { remaining } => {
                warn!(class, remaining = remaining.len(), "Rejected record");
                return Err(Error::Unrepairable { remaining });
            }
        }

        let mut document = run.document;
        annotate_types(&mut document, class);
        let id = self.store.insert(document, class)?;
        info!(id = %id, iterations = run.iterations, "Ingested record");

        Ok(IngestReceipt {
            id,
            iterations: run.iterations,
            rule_counts: run.rule_counts,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
