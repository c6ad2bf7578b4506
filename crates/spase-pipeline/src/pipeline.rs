//! Validate/repair loop
//!
//! Each iteration validates the whole record and runs one repair pass over
//! the issues found. The loop stops as soon as the record is valid, a pass
//! changes nothing, or `max_iterations` passes have run.
//!
//! Every pass that continues the loop applies at least one fix, so
//! `iterations` never exceeds the total number of fixes. It can exceed the
//! initial issue count: wrapping an object in a list makes the validator
//! check the object's members on the next pass, which can surface issues
//! that were hidden the first time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use spase_validation::{ValidationEngine, ValidationIssue};

use crate::repair::{repair, RuleCatalogue};
use crate::Result;

pub const DEFAULT_MAX_ITERATIONS: usize = 32;

/// Loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Upper bound on repair passes per record
    pub max_iterations: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    Valid,
    /// A pass applied no fix; these issues remain
    Unrepairable { remaining: Vec<ValidationIssue> },
    /// The pass budget ran out; these issues remain
    IterationLimit { remaining: Vec<ValidationIssue> },
}

impl RepairOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn remaining(&self) -> &[ValidationIssue] {
        match self {
            Self::Valid => &[],
            Self::Unrepairable { remaining } | Self::IterationLimit { remaining } => remaining,
        }
    }
}

/// Result of one run: the outcome plus the record in its final state
#[derive(Debug, Clone)]
pub struct RepairRun {
    pub outcome: RepairOutcome,
    pub document: Value,
    /// Repair passes executed
    pub iterations: usize,
    /// Fixes applied, by rule name
    pub rule_counts: BTreeMap<String, usize>,
}

/// Drives validation and repair for records of one class
pub struct RepairPipeline {
    engine: ValidationEngine,
    catalogue: RuleCatalogue,
    config: RepairConfig,
}

impl RepairPipeline {
    /// Pipeline with the default catalogue and configuration
    pub fn new(engine: ValidationEngine) -> Self {
        Self {
            engine,
            catalogue: RuleCatalogue::default(),
            config: RepairConfig::default(),
        }
    }

    /// Compile `schema` and build a pipeline for it
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] if the schema does not compile.
    pub fn from_schema(schema: &Value) -> Result<Self> {
        Ok(Self::new(ValidationEngine::new(schema)?))
    }

    #[must_use]
    pub fn with_catalogue(mut self, catalogue: RuleCatalogue) -> Self {
        self.catalogue = catalogue;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: RepairConfig) -> Self {
        self.config = config;
        self
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    pub fn config(&self) -> &RepairConfig {
        &self.config
    }

    /// Validate and repair `document` until it converges
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Repair`] if a fix cannot be written back.
    pub fn run(&self, mut document: Value) -> Result<RepairRun> {
        let mut iterations = 0;
        let mut rule_counts = BTreeMap::new();

        let outcome = loop {
            let issues = self.engine.validate(&document);
            if issues.is_empty() {
                break RepairOutcome::Valid;
            }
            if iterations >= self.config.max_iterations {
                warn!(
                    iterations,
                    remaining = issues.len(),
                    "Repair iteration limit reached"
                );
                break RepairOutcome::IterationLimit { remaining: issues };
            }

            iterations += 1;
            let pass = repair(&mut document, &issues, &self.catalogue)?;
            debug!(
                iteration = iterations,
                issues = issues.len(),
                fixes = pass.fixes.len(),
                "Repair pass"
            );
            if !pass.applied {
                break RepairOutcome::Unrepairable { remaining: issues };
            }
            for fix in pass.fixes {
                *rule_counts.entry(fix.rule).or_insert(0) += 1;
            }
        };

        info!(
            valid = outcome.is_valid(),
            iterations,
            remaining = outcome.remaining().len(),
            "Repair run finished"
        );
        Ok(RepairRun {
            outcome,
            document,
            iterations,
            rule_counts,
        })
    }
}
