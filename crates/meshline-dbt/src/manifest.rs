//! dbt manifest.json parsing
//!
//! Parses the subset of a dbt-generated manifest.json needed for lineage
//! validation and registry publishing. Every section is optional: a manifest
//! missing `parent_map` or `nodes`, or carrying `null` for them, parses as
//! empty, while a section of the wrong shape is a parse error.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// dbt manifest.json structure (subset of fields we care about)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Metadata about the manifest
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ManifestMetadata,

    /// Model, seed, test and snapshot nodes
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: BTreeMap<String, ManifestNode>,

    /// Parent map (node -> resolved parent nodes)
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent_map: BTreeMap<String, Vec<String>>,
}

impl Manifest {
    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse manifest from JSON string
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json)
            .map_err(|e| ManifestError::ParseError(e.to_string()))
    }

    /// Project that produced this manifest, or "unknown"
    pub fn project_name(&self) -> &str {
        self.metadata.project_name.as_deref().unwrap_or("unknown")
    }

    /// Get all model nodes (filters out tests, seeds, etc.)
    pub fn models(&self) -> impl Iterator<Item = (&String, &ManifestNode)> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.is_model())
    }

    /// Identifiers of models other projects may reference
    pub fn public_models(&self) -> Vec<&str> {
        self.models()
            .filter(|(_, node)| node.is_public())
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// dbt writes `null` for sections it did not compute
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Manifest metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub project_name: Option<String>,
}

/// A node in the manifest (model, test, snapshot, etc.)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    /// Resource type (model, test, snapshot, etc.)
    #[serde(default)]
    pub resource_type: String,

    /// Access level for dbt mesh (public, protected, private)
    #[serde(default)]
    pub access: Option<String>,

    /// Declared dependencies
    #[serde(default, deserialize_with = "null_as_default")]
    pub depends_on: DependsOn,
}

impl ManifestNode {
    pub fn is_model(&self) -> bool {
        self.resource_type == "model"
    }

    pub fn is_public(&self) -> bool {
        self.access.as_deref() == Some("public")
    }
}

/// Dependencies structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependsOn {
    /// List of node unique_ids this node depends on
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<String>,
}

/// Manifest loading errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),
}
