//! Repair rules
//!
//! A rule looks at one validation issue and the value currently found at
//! the issue's path, and either proposes a [`Fix`] or declines. The engine
//! skips issues whose path no longer holds the value that was reported, so
//! running a pass twice with the same issues changes nothing the second
//! time.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use spase_doc::{get, set, DocPath};
use spase_validation::{IssueKind, ValidationIssue};

/// Errors raised while applying fixes
#[derive(Error, Debug)]
pub enum RepairError {
    #[error("Rule '{rule}' wrote to {path} but reading it back gave a different value")]
    SelfCheck { rule: String, path: String },

    #[error("Rule '{rule}' could not write to {path}: {source}")]
    Write {
        rule: String,
        path: String,
        #[source]
        source: spase_doc::Error,
    },
}

/// A replacement value for one location
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub path: DocPath,
    pub value: Value,
}

impl Fix {
    pub fn at(path: DocPath, value: Value) -> Self {
        Self { path, value }
    }
}

/// One fix that was written
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedFix {
    pub rule: String,
    pub path: DocPath,
}

pub trait RepairRule {
    /// Stable rule name, used in logs and run statistics
    fn name(&self) -> &'static str;

    /// Propose a fix for `issue` given the value now at `issue.path`
    fn propose(&self, issue: &ValidationIssue, current: &Value) -> Option<Fix>;
}

/// `type: array` on a non-array value: wrap it in a one-element list
#[derive(Debug, Default, Clone, Copy)]
pub struct WrapInArray;

impl RepairRule for WrapInArray {
    fn name(&self) -> &'static str {
        "wrap-in-array"
    }

    fn propose(&self, issue: &ValidationIssue, current: &Value) -> Option<Fix> {
        match &issue.kind {
            IssueKind::TypeMismatch { expected, .. } if expected == "array" && !current.is_array() => {
                Some(Fix::at(issue.path.clone(), Value::Array(vec![current.clone()])))
            }
            _ => None,
        }
    }
}

/// A time span missing `StopDate` gets a copy of its `StartDate`
#[derive(Debug, Default, Clone, Copy)]
pub struct StopDateFromStartDate;

impl RepairRule for StopDateFromStartDate {
    fn name(&self) -> &'static str {
        "stop-date-from-start-date"
    }

    fn propose(&self, issue: &ValidationIssue, current: &Value) -> Option<Fix> {
        let IssueKind::MissingRequired { property } = &issue.kind else {
            return None;
        };
        if property != "StopDate" {
            return None;
        }
        let object = current.as_object()?;
        if object.contains_key("StopDate") {
            return None;
        }
        let start = object.get("StartDate")?;
        Some(Fix::at(issue.path.clone().key("StopDate"), start.clone()))
    }
}

/// `format: date-time` on a timestamp without an offset: read it as UTC
#[derive(Debug, Default, Clone, Copy)]
pub struct UtcSuffix;

impl RepairRule for UtcSuffix {
    fn name(&self) -> &'static str {
        "utc-suffix"
    }

    fn propose(&self, issue: &ValidationIssue, current: &Value) -> Option<Fix> {
        match (&issue.kind, current) {
            (IssueKind::FormatViolation { format }, Value::String(text))
                if format == "date-time" && !text.ends_with('Z') =>
            {
                Some(Fix::at(issue.path.clone(), Value::String(format!("{text}Z"))))
            }
            _ => None,
        }
    }
}

/// `type: string` on a non-empty list: keep the first element as a string
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstElementAsString;

impl RepairRule for FirstElementAsString {
    fn name(&self) -> &'static str {
        "first-element-as-string"
    }

    fn propose(&self, issue: &ValidationIssue, current: &Value) -> Option<Fix> {
        let IssueKind::TypeMismatch { expected, .. } = &issue.kind else {
            return None;
        };
        if expected != "string" {
            return None;
        }
        let first = current.as_array()?.first()?;
        let text = match first {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some(Fix::at(issue.path.clone(), Value::String(text)))
    }
}

/// Ordered list of rules; the first rule that proposes a fix wins
pub struct RuleCatalogue {
    rules: Vec<Box<dyn RepairRule>>,
}

impl RuleCatalogue {
    /// An empty catalogue
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule at the lowest priority
    #[must_use]
    pub fn with_rule(mut self, rule: impl RepairRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule with a proposal for `issue`
    pub fn propose(&self, issue: &ValidationIssue, current: &Value) -> Option<(&'static str, Fix)> {
        self.rules
            .iter()
            .find_map(|rule| rule.propose(issue, current).map(|fix| (rule.name(), fix)))
    }
}

impl Default for RuleCatalogue {
    fn default() -> Self {
        Self::new()
            .with_rule(WrapInArray)
            .with_rule(StopDateFromStartDate)
            .with_rule(UtcSuffix)
            .with_rule(FirstElementAsString)
    }
}

/// Outcome of one repair pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairPass {
    /// True if any fix was written
    pub applied: bool,
    pub fixes: Vec<AppliedFix>,
    /// Issues no rule handled, in the order given
    pub outstanding: Vec<ValidationIssue>,
}

/// Apply the first matching rule to each issue, in order.
///
/// Issues whose path cannot be reached, or whose path no longer holds the
/// reported instance, are left outstanding.
///
/// # Errors
///
/// Returns [`RepairError::Write`] if a fix cannot be written and
/// [`RepairError::SelfCheck`] if a written value does not read back.
pub fn repair(
    document: &mut Value,
    issues: &[ValidationIssue],
    catalogue: &RuleCatalogue,
) -> Result<RepairPass, RepairError> {
    let mut pass = RepairPass::default();

    for issue in issues {
        let proposal = match get(document, &issue.path) {
            Ok(current) if *current == issue.instance => catalogue.propose(issue, current),
            Ok(_) => {
                trace!(path = %issue.path, "Value changed since validation; skipping");
                None
            }
            Err(e) => {
                trace!(path = %issue.path, error = %e, "Issue path not reachable");
                None
            }
        };

        let Some((rule, fix)) = proposal else {
            pass.outstanding.push(issue.clone());
            continue;
        };

        set(document, &fix.path, fix.value.clone()).map_err(|source| RepairError::Write {
            rule: rule.to_string(),
            path: fix.path.to_pointer(),
            source,
        })?;
        if get(document, &fix.path).ok() != Some(&fix.value) {
            return Err(RepairError::SelfCheck {
                rule: rule.to_string(),
                path: fix.path.to_pointer(),
            });
        }

        debug!(rule, path = %fix.path, "Applied fix");
        pass.applied = true;
        pass.fixes.push(AppliedFix {
            rule: rule.to_string(),
            path: fix.path,
        });
    }

    Ok(pass)
}
