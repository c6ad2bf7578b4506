//! SPASE records and their provenance
#![allow(clippy::must_use_candidate)] // Builder/constructor API intentionally omits pervasive #[must_use].
#![allow(clippy::return_self_not_must_use)] // Fluent builder methods return Self for ergonomics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{Error, Result};

/// Name of the outer element that wraps published SPASE records.
pub const SPASE_ENVELOPE: &str = "Spase";

/// A SPASE record: one resource body plus where it came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// The resource body (e.g. the contents of `DisplayData`)
    pub body: Value,

    /// Record-level metadata
    pub metadata: RecordMetadata,
}

/// Metadata associated with a record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Resource class of the body (e.g. `DisplayData`, `NumericalData`)
    pub resource_type: Option<String>,

    /// Where the record was read from (URL or file path)
    pub source: Option<String>,

    /// SPASE model version declared by the envelope
    pub version: Option<String>,

    /// When the record was loaded
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Create a record from a bare resource body
    pub fn new(body: Value) -> Self {
        Self {
            body,
            metadata: RecordMetadata {
                loaded_at: Some(Utc::now()),
                ..RecordMetadata::default()
            },
        }
    }

    /// Set the resource class
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.metadata.resource_type = Some(resource_type.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.source = Some(source.into());
        self
    }

    /// Unwrap a published record of the form `{"Spase": {"version": .., "<Class>": {..}}}`.
    ///
    /// When `resource_type` is `None` the envelope must hold exactly one
    /// object-valued member besides `version`, and that member's name becomes
    /// the resource type. A value without an envelope is taken as a bare body
    /// and requires `resource_type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Envelope`] when the requested class is absent or the
    /// class cannot be determined.
    pub fn from_envelope(value: Value, resource_type: Option<&str>) -> Result<Self> {
        let Value::Object(mut outer) = value else {
            return Err(Error::Envelope("record is not a JSON object".to_string()));
        };

        let Some(Value::Object(mut envelope)) = outer.remove(SPASE_ENVELOPE) else {
            let class = resource_type.ok_or_else(|| {
                Error::Envelope(
                    "record has no Spase envelope and no resource type was given".to_string(),
                )
            })?;
            debug!(class, "Treating record as a bare resource body");
            return Ok(Record::new(Value::Object(outer)).with_resource_type(class));
        };

        let version = envelope
            .remove("version")
            .and_then(|v| v.as_str().map(str::to_string));

        let class = match resource_type {
            Some(class) => class.to_string(),
            None => {
                let candidates: Vec<&String> = envelope
                    .iter()
                    .filter(|(key, value)| !key.starts_with('@') && value.is_object())
                    .map(|(key, _)| key)
                    .collect();
                match candidates.as_slice() {
                    [only] => (*only).clone(),
                    [] => return Err(Error::Envelope("envelope holds no resource".to_string())),
                    many => {
                        return Err(Error::Envelope(format!(
                            "envelope holds several resources ({}); name one",
                            many.iter()
                                .map(|s| s.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        )));
                    }
                }
            }
        };

        let body = envelope
            .remove(&class)
            .ok_or_else(|| Error::Envelope(format!("envelope has no '{class}' resource")))?;

        debug!(class = %class, ?version, "Unwrapped Spase envelope");
        let mut record = Record::new(body).with_resource_type(class);
        record.metadata.version = version;
        Ok(record)
    }

    /// Resource class, if known
    pub fn resource_type(&self) -> Option<&str> {
        self.metadata.resource_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_named_class() {
        let value = json!({
            "Spase": {
                "version": "2.6.0",
                "DisplayData": {"ResourceID": "spase://x"}
            }
        });
        let record = Record::from_envelope(value, Some("DisplayData")).unwrap();
        assert_eq!(record.resource_type(), Some("DisplayData"));
        assert_eq!(record.metadata.version.as_deref(), Some("2.6.0"));
        assert_eq!(record.body, json!({"ResourceID": "spase://x"}));
        assert!(record.metadata.loaded_at.is_some());
    }

    #[test]
    fn test_unwrap_infers_class() {
        let value = json!({"Spase": {"version": "2.6.0", "Model": {"ResourceID": "m"}}});
        let record = Record::from_envelope(value, None).unwrap();
        assert_eq!(record.resource_type(), Some("Model"));
    }

    #[test]
    fn test_unwrap_ambiguous() {
        let value = json!({"Spase": {"Model": {}, "Person": {}}});
        let err = Record::from_envelope(value, None).unwrap_err();
        assert!(err.to_string().contains("several resources"));
    }

    #[test]
    fn test_unwrap_missing_class() {
        let value = json!({"Spase": {"Model": {}}});
        assert!(Record::from_envelope(value, Some("DisplayData")).is_err());
    }

    #[test]
    fn test_bare_body_needs_class() {
        let value = json!({"ResourceID": "x"});
        assert!(Record::from_envelope(value.clone(), None).is_err());
        let record = Record::from_envelope(value, Some("Person"))
            .unwrap()
            .with_source("person.json");
        assert_eq!(record.body, json!({"ResourceID": "x"}));
        assert_eq!(record.metadata.source.as_deref(), Some("person.json"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Record::from_envelope(json!([1, 2]), Some("X")).is_err());
    }
}
