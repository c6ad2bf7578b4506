#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # spase-pipeline
//!
//! Validate → repair → insert for SPASE records.
//!
//! A [`RepairPipeline`] validates a record, applies the first matching rule
//! of its [`RuleCatalogue`] to every issue, and repeats until the record is
//! valid, no rule applies, or the iteration cap is hit. An [`Ingestor`]
//! drives that loop and hands only valid, `@type`-annotated records to a
//! [`DocumentStore`].

pub mod annotate;
pub mod ingest;
pub mod pipeline;
pub mod repair;
pub mod store;

pub use annotate::annotate_types;
pub use ingest::{IngestReceipt, Ingestor};
pub use pipeline::{RepairConfig, RepairOutcome, RepairPipeline, RepairRun};
pub use repair::{
    repair, AppliedFix, Fix, FirstElementAsString, RepairError, RepairPass, RepairRule,
    RuleCatalogue, StopDateFromStartDate, UtcSuffix, WrapInArray,
};
pub use store::{DocumentStore, InMemoryStore, StoreError, StoredDocument};

use spase_validation::ValidationIssue;
use thiserror::Error;

/// Errors that can occur in the pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] spase_validation::Error),

    #[error("Repair error: {0}")]
    Repair(#[from] RepairError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Record could not be repaired: {} issue(s) remain", remaining.len())]
    Unrepairable { remaining: Vec<ValidationIssue> },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use spase_doc::DocPath;

    #[test]
    fn unrepairable_error_counts_remaining_issues() {
        let error = Error::Unrepairable {
            remaining: vec![ValidationIssue {
                path: DocPath::root().key("Extra"),
                kind: spase_validation::IssueKind::Other {
                    keyword: "minLength".to_string(),
                },
                expected: serde_json::Value::Null,
                instance: serde_json::json!(""),
                message: "\"\" is shorter than 1 character".to_string(),
            }],
        };
        assert_eq!(
            error.to_string(),
            "Record could not be repaired: 1 issue(s) remain"
        );
    }

    #[test]
    fn store_error_converts() {
        let error: Error = StoreError::Duplicate("DisplayData/1".to_string()).into();
        assert!(matches!(error, Error::Store(StoreError::Duplicate(_))));
    }
}
