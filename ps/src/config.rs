//! Configuration for progressstore

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding persisted progress
    #[serde(rename = "storage-path")]
    pub storage_path: PathBuf,

    /// Prefix for every persisted key
    pub namespace: String,

    /// Catalog file (YAML or JSON)
    #[serde(rename = "catalog-path")]
    pub catalog_path: Option<PathBuf>,

    /// Name written into exported documents
    #[serde(rename = "project-name")]
    pub project_name: String,

    /// Product slug used for the export file name
    pub product: String,

    /// Default log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("progressstore")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            namespace: crate::DEFAULT_NAMESPACE.to_string(),
            catalog_path: None,
            project_name: crate::DEFAULT_PROJECT_NAME.to_string(),
            product: crate::DEFAULT_PRODUCT.to_string(),
            log_level: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// An explicit path must load. Otherwise `./progressstore.yml`, then
    /// `<config_dir>/progressstore/progressstore.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let candidates = [
            Some(PathBuf::from("progressstore.yml")),
            dirs::config_dir().map(|p| p.join("progressstore").join("progressstore.yml")),
        ];

        for path in candidates.iter().flatten() {
            if path.exists() {
                match Self::load_from_file(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
