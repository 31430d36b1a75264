//! Local filesystem registry
//!
//! Mirrors the object layout as directories under a registry root, so a
//! checked-out registry can stand in for a bucket.

use crate::error::RegistryError;
use crate::partition::{PartitionKind, PublishTimestamp, RegistryPartition, MANIFEST_FILE_NAME};
use crate::publisher::RegistryBackend;
use std::path::PathBuf;

/// Registry rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute-or-relative path of a partition's manifest
    pub fn path_for(&self, partition: &RegistryPartition) -> PathBuf {
        self.root.join(partition.relative_path())
    }

    /// Bytes of the latest manifest for `(project, environment)`
    pub fn read_latest(&self, project: &str, environment: &str) -> Result<Vec<u8>, RegistryError> {
        let path = self.path_for(&RegistryPartition::latest(project, environment));
        std::fs::read(&path).map_err(|e| RegistryError::io(path, e))
    }

    /// History partitions for `(project, environment)`, oldest first
    ///
    /// Directories that are not publish timestamps or hold no manifest are
    /// skipped. A missing history directory yields an empty list.
    pub fn history(&self, project: &str, environment: &str) -> Result<Vec<PublishTimestamp>, RegistryError> {
        let dir = self
            .root
            .join(project)
            .join(environment)
            .join(PartitionKind::History.as_str());

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RegistryError::io(dir, e)),
        };

        let mut timestamps = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RegistryError::io(&dir, e))?;
            if !entry.path().join(MANIFEST_FILE_NAME).is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(ts) = name.to_str().and_then(|n| PublishTimestamp::parse(n).ok()) {
                timestamps.push(ts);
            }
        }

        timestamps.sort();
        Ok(timestamps)
    }
}

impl RegistryBackend for LocalRegistry {
    fn name(&self) -> &'static str {
        "local"
    }

    fn location(&self, partition: &RegistryPartition) -> String {
        self.path_for(partition).display().to_string()
    }

    fn write(&self, partition: &RegistryPartition, content: &[u8]) -> Result<String, RegistryError> {
        let path = self.path_for(partition);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| RegistryError::io(dir, e))?;
        }
        std::fs::write(&path, content).map_err(|e| RegistryError::io(&path, e))?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "wrote manifest copy");
        Ok(path.display().to_string())
    }
}
