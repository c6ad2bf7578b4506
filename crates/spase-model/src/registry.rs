//! In-process cache of loaded models, keyed by version

use std::collections::HashMap;

use crate::model::SpaseModel;

/// Registry of parsed models
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, SpaseModel>,
}

impl ModelRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Register a model under a version key, replacing any previous one
    pub fn register(&mut self, version: impl Into<String>, model: SpaseModel) {
        self.models.insert(version.into(), model);
    }

    /// Get a model by version
    pub fn get(&self, version: &str) -> Option<&SpaseModel> {
        self.models.get(version)
    }

    /// Check if a version is cached
    pub fn contains(&self, version: &str) -> bool {
        self.models.contains_key(version)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
