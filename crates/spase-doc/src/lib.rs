#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # spase-doc
//!
//! Record representation and path navigation for SPASE documents.
//!
//! Documents are plain `serde_json::Value` trees. This crate adds the pieces
//! the validation and repair layers need on top of that: typed paths that can
//! be parsed from the JSON pointers a validator reports, and cursors that
//! navigate to a path and assign through its parent.

/// Records with their provenance metadata.
pub mod document;
/// Typed document paths.
pub mod path;
/// Read and write cursors over a document tree.
pub mod traversal;

/// Primary record type.
pub use document::{Record, RecordMetadata};
/// Path primitives.
pub use path::{DocPath, PathSegment};
/// Cursor entry points.
pub use traversal::{get, set, Cursor, CursorMut};

use thiserror::Error;

/// Errors that can occur when navigating a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Node not found at path: {path}")]
    NodeNotFound { path: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Envelope error: {0}")]
    Envelope(String),
}

impl Error {
    /// Build a node-not-found error with path context.
    pub fn node_not_found(path: impl Into<String>) -> Self {
        Self::NodeNotFound { path: path.into() }
    }

    /// Build an invalid-path error with input path and parsing reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a type-mismatch error for a container that cannot hold the segment.
    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Crate-local result type for document operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Short JSON type name of a value, as JSON Schema spells it.
#[must_use]
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_type_names() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!(true)), "boolean");
        assert_eq!(json_type_name(&json!(3)), "integer");
        assert_eq!(json_type_name(&json!(3.5)), "number");
        assert_eq!(json_type_name(&json!("x")), "string");
        assert_eq!(json_type_name(&json!([1])), "array");
        assert_eq!(json_type_name(&json!({})), "object");
    }

    #[test]
    fn error_helpers_carry_context() {
        let err = Error::invalid_path("/a/~2", "bad escape");
        assert_eq!(err.to_string(), "Invalid path '/a/~2': bad escape");

        let err = Error::type_mismatch("/a", "object or array", "string");
        assert!(err.to_string().contains("expected object or array"));
    }
}
