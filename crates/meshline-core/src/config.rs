//! Configuration schema (meshline.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted for the remote registry bucket
pub const BUCKET_ENV_VAR: &str = "DBT_MESH_BUCKET";

/// Registry publishing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Root directory of the local registry
    pub root: PathBuf,

    /// Bucket for the remote registry
    pub bucket: Option<String>,

    /// Key prefix inside the bucket
    pub key_prefix: String,

    /// Environment partition (dev/staging/prod)
    pub environment: String,

    /// Project name used in registry paths
    pub project: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("../registry"),
            bucket: None,
            key_prefix: "registry".to_string(),
            environment: "prod".to_string(),
            project: "dbt_up".to_string(),
        }
    }
}

/// Lineage validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageConfig {
    /// Upstream project whose references are looked for
    pub upstream: String,

    /// Directory holding the known downstream projects
    pub projects_root: PathBuf,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            upstream: "dbt_up".to_string(),
            projects_root: PathBuf::from("."),
        }
    }
}

impl LineageConfig {
    /// Build-output manifest path of a project under `projects_root`
    pub fn manifest_path_for(&self, project: &str) -> PathBuf {
        self.projects_root.join(project).join("target").join("manifest.json")
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Registry publishing settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Lineage validation settings
    #[serde(default)]
    pub lineage: LineageConfig,
}

impl Config {
    /// Load config from TOML file
    ///
    /// Relative paths in the file are resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        if let Some(parent) = path.parent() {
            config.registry.root = resolve(parent, &config.registry.root);
            config.lineage.projects_root = resolve(parent, &config.lineage.projects_root);
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() && !base.as_os_str().is_empty() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
