//! Model loader with search paths and caching

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace, warn};

use crate::model::SpaseModel;
use crate::registry::ModelRegistry;
use crate::{Error, Result};

/// File stem prefix of published model documents (`spase-2.6.0.json`)
const FILE_PREFIX: &str = "spase-";

/// Semantic version of a published model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModelVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Loads model documents from disk, JSON or YAML, caching by version
pub struct ModelLoader {
    registry: ModelRegistry,
    search_paths: Vec<PathBuf>,
}

impl ModelLoader {
    /// Create a new loader with the given search paths
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            registry: ModelRegistry::new(),
            search_paths,
        }
    }

    /// Load a model by version (e.g. `2.6.0`).
    /// Checks the cache first, then the search paths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no search path holds the version, or
    /// a parse error when the file is not a valid model.
    pub fn load(&mut self, version: &str) -> Result<SpaseModel> {
        if let Some(cached) = self.registry.get(version) {
            debug!("Cache hit for model: {}", version);
            return Ok(cached.clone());
        }

        trace!("Cache miss for model: {}", version);

        let path = self.find(version)?;
        let mut model = self.load_from_file(&path)?;
        if model.version.is_none() {
            model.version = Some(version.to_string());
        }

        if let Some(latest) = self.latest_version() {
            if let Ok(requested) = parse_version(version) {
                if requested < latest {
                    warn!(
                        requested = %requested,
                        latest = %latest,
                        "A newer SPASE model is available in the search paths"
                    );
                }
            }
        }

        info!("Loaded SPASE model {} from {:?}", version, path);
        self.registry.register(version, model.clone());
        Ok(model)
    }

    /// Load the newest model found in the search paths
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no model files are present.
    pub fn load_latest(&mut self) -> Result<SpaseModel> {
        let latest = self.latest_version().ok_or_else(|| {
            Error::NotFound(format!(
                "no {FILE_PREFIX}<version> model files in search paths: {:?}",
                self.search_paths
            ))
        })?;
        self.load(&latest.to_string())
    }

    /// Load a model from a specific file path. `.yaml`/`.yml` files are read
    /// as YAML, everything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::InvalidFormat`] if it does not parse.
    pub fn load_from_file(&self, path: &Path) -> Result<SpaseModel> {
        trace!("Loading model from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            self.load_from_yaml(&content)
        } else {
            self.load_from_json(&content)
        }
    }

    /// Load a model from a JSON string
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] on a parse error.
    pub fn load_from_json(&self, json: &str) -> Result<SpaseModel> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))
    }

    /// Load a model from a YAML string
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] on a parse error.
    pub fn load_from_yaml(&self, yaml: &str) -> Result<SpaseModel> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))
    }

    /// Versions available in the search paths, ascending
    pub fn available_versions(&self) -> Vec<ModelVersion> {
        let mut versions: Vec<ModelVersion> = self
            .search_paths
            .iter()
            .filter_map(|dir| std::fs::read_dir(dir).ok())
            .flatten()
            .filter_map(std::result::Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                let stem = path.file_stem()?.to_str()?.strip_prefix(FILE_PREFIX)?;
                let ext = path.extension()?.to_str()?;
                if matches!(ext, "json" | "yaml" | "yml") {
                    parse_version(stem).ok()
                } else {
                    None
                }
            })
            .collect();
        versions.sort();
        versions.dedup();
        versions
    }

    fn latest_version(&self) -> Option<ModelVersion> {
        self.available_versions().pop()
    }

    fn find(&self, version: &str) -> Result<PathBuf> {
        let variations = [
            format!("{FILE_PREFIX}{version}.json"),
            format!("{FILE_PREFIX}{version}.yaml"),
            format!("{FILE_PREFIX}{version}.yml"),
        ];

        for path in &self.search_paths {
            for variation in &variations {
                let file_path = path.join(variation);
                if file_path.exists() {
                    trace!("Found model file: {:?}", file_path);
                    return Ok(file_path);
                }
            }
        }

        Err(Error::NotFound(format!(
            "SPASE model {} not found in search paths: {:?}",
            version, self.search_paths
        )))
    }

    /// Add a search path for model files
    pub fn add_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }

    /// Get the registry (for testing/debugging)
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new(vec![PathBuf::from(".")])
    }
}

/// Parse a `major.minor.patch` version; missing parts default to zero
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] for empty or non-numeric components.
pub fn parse_version(version: &str) -> Result<ModelVersion> {
    if version.is_empty() {
        return Err(Error::InvalidFormat("Empty version string".to_string()));
    }

    let mut parts = [0u32; 3];
    for (i, part) in version.split('.').enumerate() {
        if i >= parts.len() {
            return Err(Error::InvalidFormat(format!(
                "Too many version components: {version}"
            )));
        }
        parts[i] = part
            .parse::<u32>()
            .map_err(|_| Error::InvalidFormat(format!("Invalid version component: {part}")))?;
    }

    Ok(ModelVersion {
        major: parts[0],
        minor: parts[1],
        patch: parts[2],
    })
}
