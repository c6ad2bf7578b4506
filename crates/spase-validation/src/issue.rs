//! Validation issues

use std::fmt;

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::ValidationError;
use serde_json::{json, Value};
use spase_doc::DocPath;
use tracing::warn;

/// What kind of constraint failed, decided once from the validator's error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// `type`: `expected` is the schema type name, `actual` the instance's
    TypeMismatch { expected: String, actual: String },
    /// `required`: the instance is the object missing `property`
    MissingRequired { property: String },
    FormatViolation { format: String },
    AdditionalProperties { unexpected: Vec<String> },
    EnumMismatch,
    Other { keyword: String },
}

impl IssueKind {
    /// Schema keyword that produced the issue
    pub fn keyword(&self) -> &str {
        match self {
            Self::TypeMismatch { .. } => "type",
            Self::MissingRequired { .. } => "required",
            Self::FormatViolation { .. } => "format",
            Self::AdditionalProperties { .. } => "additionalProperties",
            Self::EnumMismatch => "enum",
            Self::Other { keyword } => keyword,
        }
    }
}

/// One failed constraint at one location
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub path: DocPath,
    pub kind: IssueKind,
    /// The constraint's own value (`"array"`, `"StopDate"`, `"date-time"`, ...)
    pub expected: Value,
    /// Snapshot of the failing value when the issue was reported
    pub instance: Value,
    pub message: String,
}

impl ValidationIssue {
    /// Convert a validator error
    pub fn from_error(error: &ValidationError<'_>) -> Self {
        let pointer = error.instance_path.to_string();
        let path = issue_path(&pointer);
        let instance = error.instance.clone().into_owned();

        let (kind, expected) = match &error.kind {
            ValidationErrorKind::Type { kind } => {
                let expected = match kind {
                    TypeKind::Single(ty) => ty.to_string(),
                    TypeKind::Multiple(types) => types
                        .clone()
                        .into_iter()
                        .map(|ty| ty.to_string())
                        .collect::<Vec<_>>()
                        .join(","),
                };
                (
                    IssueKind::TypeMismatch {
                        expected: expected.clone(),
                        actual: spase_doc::json_type_name(&instance).to_string(),
                    },
                    Value::String(expected),
                )
            }
            ValidationErrorKind::Required { property } => {
                let property = property
                    .as_str()
                    .map_or_else(|| property.to_string(), str::to_string);
                (
                    IssueKind::MissingRequired {
                        property: property.clone(),
                    },
                    Value::String(property),
                )
            }
            ValidationErrorKind::Format { format } => (
                IssueKind::FormatViolation {
                    format: format.clone(),
                },
                Value::String(format.clone()),
            ),
            ValidationErrorKind::AdditionalProperties { unexpected } => (
                IssueKind::AdditionalProperties {
                    unexpected: unexpected.clone(),
                },
                json!(false),
            ),
            ValidationErrorKind::Enum { options } => (IssueKind::EnumMismatch, options.clone()),
            _ => (
                IssueKind::Other {
                    keyword: last_keyword(&error.schema_path.to_string()),
                },
                Value::Null,
            ),
        };

        Self {
            path,
            kind,
            expected,
            instance,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "/: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Parse the validator's instance pointer. An unparsable pointer is logged
/// and the issue is filed under the root.
fn issue_path(pointer: &str) -> DocPath {
    DocPath::from_pointer(pointer).unwrap_or_else(|e| {
        warn!(pointer, error = %e, "Unparsable instance path; reporting issue at root");
        DocPath::root()
    })
}

fn last_keyword(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .find(|token| !token.is_empty() && !token.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or("unknown")
        .to_string()
}
