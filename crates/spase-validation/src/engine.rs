//! Validation engine

use jsonschema::{Draft, Validator};
use serde_json::Value;
use tracing::{debug, trace};

use crate::formats::is_iso8601_duration;
use crate::issue::ValidationIssue;
use crate::{Error, Result};

/// Validation configuration
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Assert `format` keywords (`date-time`, `duration`, ...)
    pub validate_formats: bool,
    /// Maximum issues collected by [`ValidationEngine::validate`] (0 = unlimited)
    pub max_errors: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_formats: true,
            max_errors: 0,
        }
    }
}

/// Compiled draft-07 validator for one JSON Schema
pub struct ValidationEngine {
    validator: Validator,
    config: ValidationConfig,
}

impl ValidationEngine {
    /// Compile `schema` with the default configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the schema does not compile.
    pub fn new(schema: &Value) -> Result<Self> {
        Self::with_config(schema, ValidationConfig::default())
    }

    /// Compile `schema` with a specific configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the schema does not compile.
    pub fn with_config(schema: &Value, config: ValidationConfig) -> Result<Self> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft7)
            .should_validate_formats(config.validate_formats)
            .with_format("duration", is_iso8601_duration)
            .build(schema)
            .map_err(|e| Error::Schema(e.to_string()))?;
        debug!(formats = config.validate_formats, "Compiled validator");
        Ok(Self { validator, config })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Lazily yield every issue in `document`. Each call is an independent
    /// pass over the current state of the document.
    pub fn iter_errors<'a>(&'a self, document: &'a Value) -> impl Iterator<Item = ValidationIssue> + 'a {
        self.validator
            .iter_errors(document)
            .map(|error| ValidationIssue::from_error(&error))
    }

    /// Collect the issues in `document`, honouring `max_errors`
    pub fn validate(&self, document: &Value) -> Vec<ValidationIssue> {
        let limit = match self.config.max_errors {
            0 => usize::MAX,
            n => n,
        };
        let issues: Vec<ValidationIssue> = self.iter_errors(document).take(limit).collect();
        for issue in &issues {
            trace!(path = %issue.path, keyword = issue.kind.keyword(), "Validation issue");
        }
        debug!(issues = issues.len(), "Validated document");
        issues
    }

    pub fn is_valid(&self, document: &Value) -> bool {
        self.validator.is_valid(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueKind;
    use serde_json::json;
    use spase_doc::DocPath;

    fn time_span_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "StartDate": {"type": "string", "format": "date-time"},
                "StopDate": {"type": "string", "format": "date-time"},
                "Cadence": {"type": "string", "format": "duration"},
                "Role": {"type": "array", "items": {"type": "string", "enum": ["PI", "Contributor"]}},
                "Name": {"type": "string"}
            },
            "required": ["StartDate", "StopDate"],
            "additionalProperties": false
        })
    }

    fn engine() -> ValidationEngine {
        ValidationEngine::new(&time_span_schema()).unwrap()
    }

    #[test]
    fn test_valid_document() {
        let doc = json!({
            "StartDate": "2020-01-01T00:00:00Z",
            "StopDate": "2020-01-02T00:00:00Z",
            "Cadence": "PT1M",
            "Role": ["PI"]
        });
        assert!(engine().validate(&doc).is_empty());
        assert!(engine().is_valid(&doc));
    }

    #[test]
    fn test_missing_required() {
        let doc = json!({"StartDate": "2020-01-01T00:00:00Z"});
        let issues = engine().validate(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].kind,
            IssueKind::MissingRequired {
                property: "StopDate".to_string()
            }
        );
        assert!(issues[0].path.is_root());
        assert_eq!(issues[0].instance, doc);
    }

    #[test]
    fn test_type_mismatch_array() {
        let doc = json!({
            "StartDate": "2020-01-01T00:00:00Z",
            "StopDate": "2020-01-01T00:00:00Z",
            "Role": "PI"
        });
        let issues = engine().validate(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].kind,
            IssueKind::TypeMismatch {
                expected: "array".to_string(),
                actual: "string".to_string()
            }
        );
        assert_eq!(issues[0].path, DocPath::root().key("Role"));
        assert_eq!(issues[0].instance, json!("PI"));
        assert_eq!(issues[0].expected, json!("array"));
    }

    #[test]
    fn test_format_violations() {
        let doc = json!({
            "StartDate": "2020-01-01T00:00:00",
            "StopDate": "2020-01-01T00:00:00Z",
            "Cadence": "one minute"
        });
        let issues = engine().validate(&doc);
        let formats: Vec<&str> = issues
            .iter()
            .filter_map(|i| match &i.kind {
                IssueKind::FormatViolation { format } => Some(format.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(issues.len(), 2);
        assert!(formats.contains(&"date-time"));
        assert!(formats.contains(&"duration"));
    }

    #[test]
    fn test_formats_can_be_disabled() {
        let config = ValidationConfig {
            validate_formats: false,
            ..Default::default()
        };
        let engine = ValidationEngine::with_config(&time_span_schema(), config).unwrap();
        let doc = json!({"StartDate": "yesterday", "StopDate": "today"});
        assert!(engine.validate(&doc).is_empty());
    }

    #[test]
    fn test_enum_and_additional_properties() {
        let doc = json!({
            "StartDate": "2020-01-01T00:00:00Z",
            "StopDate": "2020-01-01T00:00:00Z",
            "Role": ["Boss"],
            "Extra": 1
        });
        let issues = engine().validate(&doc);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|i| i.kind == IssueKind::EnumMismatch
            && i.path == DocPath::root().key("Role").index(0)));
        assert!(issues.iter().any(|i| i.kind
            == IssueKind::AdditionalProperties {
                unexpected: vec!["Extra".to_string()]
            }));
    }

    #[test]
    fn test_iter_errors_is_reinvocable() {
        let engine = engine();
        let doc = json!({"Name": ["x"]});
        let first: Vec<_> = engine.iter_errors(&doc).collect();
        let second: Vec<_> = engine.iter_errors(&doc).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_max_errors() {
        let config = ValidationConfig {
            max_errors: 1,
            ..Default::default()
        };
        let engine = ValidationEngine::with_config(&time_span_schema(), config).unwrap();
        assert_eq!(engine.validate(&json!({})).len(), 1);
    }

    #[test]
    fn test_non_object_document_does_not_fail() {
        let issues = engine().validate(&json!(42));
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0].kind, IssueKind::TypeMismatch { ref expected, .. } if expected == "object"));
    }
}
