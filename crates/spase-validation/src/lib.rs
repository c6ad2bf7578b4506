#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # spase-validation
//!
//! Validation of SPASE records against an emitted JSON Schema.
//!
//! The engine compiles the schema once (draft-07, format assertions on) and
//! turns every validator error into a [`ValidationIssue`] with a typed
//! [`IssueKind`] and a [`spase_doc::DocPath`], which is what the repair rules
//! dispatch on. Issues can be rendered as text or written as a CSV error
//! table.
//!
//! ## Example Usage
//!
//! ```rust
//! use serde_json::json;
//! use spase_validation::{IssueKind, ValidationEngine};
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"Keyword": {"type": "array", "items": {"type": "string"}}},
//!     "required": ["Keyword"],
//!     "additionalProperties": false
//! });
//! let engine = ValidationEngine::new(&schema).unwrap();
//!
//! let issues = engine.validate(&json!({"Keyword": "Sun"}));
//! assert_eq!(issues.len(), 1);
//! assert!(matches!(issues[0].kind, IssueKind::TypeMismatch { .. }));
//! ```

pub mod engine;
pub mod formats;
pub mod issue;
pub mod reporter;

pub use engine::{ValidationConfig, ValidationEngine};
pub use formats::is_iso8601_duration;
pub use issue::{IssueKind, ValidationIssue};
pub use reporter::{ValidationReport, ValidationReporter, REPORT_COLUMNS};

use thiserror::Error;

/// Errors that can occur during validation
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Convenience function: compile `schema` and validate `document` once
///
/// # Errors
///
/// Returns [`Error::Schema`] if the schema does not compile.
pub fn validate(
    schema: &serde_json::Value,
    document: &serde_json::Value,
) -> Result<Vec<ValidationIssue>> {
    let engine = ValidationEngine::new(schema)?;
    Ok(engine.validate(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convenience_validate() {
        let schema = json!({"type": "object"});
        assert!(validate(&schema, &json!({})).unwrap().is_empty());
        assert_eq!(validate(&schema, &json!([])).unwrap().len(), 1);
    }

    #[test]
    fn test_convenience_validate_bad_schema() {
        let schema = json!({"type": "no-such-type"});
        assert!(matches!(validate(&schema, &json!({})), Err(Error::Schema(_))));
    }
}
