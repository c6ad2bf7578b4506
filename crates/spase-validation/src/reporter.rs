//! Validation reporter
//!
//! Collects the issues of many records into one error table, one row per
//! issue, and writes it as CSV.

use std::fmt;
use std::io::Write;

use serde_json::Value;
use tracing::{debug, trace};

use crate::issue::ValidationIssue;
use crate::{Error, Result};

/// Header row of the CSV error table
pub const REPORT_COLUMNS: [&str; 7] = [
    "frame_type",
    "source",
    "message",
    "path",
    "instance",
    "validator",
    "validator_value",
];

/// Issues found in one record
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Class the record was validated as
    pub frame_type: String,
    /// Where the record came from (file path or URL)
    pub source: String,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(
        frame_type: impl Into<String>,
        source: impl Into<String>,
        issues: Vec<ValidationIssue>,
    ) -> Self {
        Self {
            frame_type: frame_type.into(),
            source: source.into(),
            issues,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Human-readable listing, one issue per line
    pub fn render_text(&self) -> String {
        self.to_string()
    }

    /// Table rows for this report, in [`REPORT_COLUMNS`] order
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.issues
            .iter()
            .map(|issue| {
                vec![
                    self.frame_type.clone(),
                    self.source.clone(),
                    issue.message.clone(),
                    issue.path.to_pointer(),
                    cell(&issue.instance),
                    issue.kind.keyword().to_string(),
                    cell(&issue.expected),
                ]
            })
            .collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return writeln!(f, "{} ({}): valid", self.source, self.frame_type);
        }
        writeln!(
            f,
            "{} ({}): {} issue(s)",
            self.source,
            self.frame_type,
            self.issues.len()
        )?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

/// Strings are written bare, everything else as compact JSON
fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Writes reports as a CSV error table
pub struct ValidationReporter {
    delimiter: u8,
    has_header: bool,
}

impl ValidationReporter {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }

    /// Set delimiter character
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Configure header writing
    #[must_use]
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Write every issue of every report
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`] if a row cannot be written.
    pub fn write_csv<W: Write>(&self, writer: W, reports: &[ValidationReport]) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        if self.has_header {
            csv_writer
                .write_record(REPORT_COLUMNS)
                .map_err(|e| Error::Report(e.to_string()))?;
        }

        let mut row_count = 0;
        for report in reports {
            for row in report.rows() {
                csv_writer
                    .write_record(&row)
                    .map_err(|e| Error::Report(e.to_string()))?;
                trace!(?row, "Wrote CSV row");
                row_count += 1;
            }
        }

        csv_writer.flush()?;
        debug!(reports = reports.len(), rows = row_count, "Finished writing error table");
        Ok(())
    }
}

impl Default for ValidationReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueKind;
    use serde_json::json;
    use spase_doc::DocPath;

    fn report() -> ValidationReport {
        ValidationReport::new(
            "DisplayData",
            "records/Clg_Solar_Image.json",
            vec![
                ValidationIssue {
                    path: DocPath::root().key("InstrumentID"),
                    kind: IssueKind::TypeMismatch {
                        expected: "array".into(),
                        actual: "string".into(),
                    },
                    expected: json!("array"),
                    instance: json!("spase://ASWS/Instrument/Culgoora"),
                    message: "\"spase://ASWS/Instrument/Culgoora\" is not of type \"array\"".into(),
                },
                ValidationIssue {
                    path: DocPath::root().key("TemporalDescription").key("TimeSpan"),
                    kind: IssueKind::MissingRequired {
                        property: "StopDate".into(),
                    },
                    expected: json!("StopDate"),
                    instance: json!({"StartDate": "2000-01-01T00:00:00"}),
                    message: "\"StopDate\" is a required property".into(),
                },
            ],
        )
    }

    #[test]
    fn test_csv_table() {
        let mut out = Vec::new();
        ValidationReporter::new()
            .write_csv(&mut out, &[report()])
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], REPORT_COLUMNS.join(","));
        assert!(lines[1].starts_with("DisplayData,records/Clg_Solar_Image.json,"));
        assert!(lines[1].ends_with(",/InstrumentID,spase://ASWS/Instrument/Culgoora,type,array"));
        assert!(lines[2].contains("required,StopDate"));
        assert!(lines[2].contains(r#""{""StartDate"":""2000-01-01T00:00:00""}""#));
    }

    #[test]
    fn test_csv_without_header() {
        let mut out = Vec::new();
        ValidationReporter::new()
            .has_header(false)
            .with_delimiter(b';')
            .write_csv(&mut out, &[report()])
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("DisplayData;"));
    }

    #[test]
    fn test_render_text() {
        let text = report().render_text();
        assert!(text.starts_with("records/Clg_Solar_Image.json (DisplayData): 2 issue(s)"));
        assert!(text.contains("  /TemporalDescription/TimeSpan: \"StopDate\" is a required property"));
        assert_eq!(text.lines().count(), 3);
        assert_eq!(format!("{}", report()), text);

        let valid = ValidationReport::new("DisplayData", "x.json", vec![]);
        assert!(valid.is_valid());
        assert_eq!(valid.render_text(), "x.json (DisplayData): valid\n");
    }
}
