//! `--config` file

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use spase_emit::GraphContext;
use spase_pipeline::RepairConfig;

/// CLI configuration; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directories searched for `spase-<version>.{json,yaml,yml}`
    pub model_paths: Vec<PathBuf>,
    pub context: GraphContext,
    pub repair: RepairConfig,
}

impl CliConfig {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid configuration")
    }

    /// Read `path`, or fall back to defaults when no file was given
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("In {}", path.display()))
    }
}
