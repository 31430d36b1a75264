//! Manifest publishing
//!
//! Every publish writes the same bytes twice: once to the `latest`
//! partition and once to a fresh `history/<timestamp>` partition.

use crate::error::RegistryError;
use crate::local::LocalRegistry;
use crate::partition::{PublishTimestamp, RegistryPartition};
use crate::s3::S3Sink;
use crate::sink::ObjectRegistry;
use meshline_core::RegistryConfig;
use sha2::{Digest, Sha256};
use std::path::Path;

/// A place partitions can be written to
pub trait RegistryBackend {
    /// Backend name for logs (e.g., "local", "S3")
    fn name(&self) -> &'static str;

    /// Human-readable location of a partition's manifest
    fn location(&self, partition: &RegistryPartition) -> String;

    /// Write `content` as the partition's manifest, returning its location
    ///
    /// Creates whatever directories or prefixes are needed and replaces any
    /// existing content.
    fn write(&self, partition: &RegistryPartition, content: &[u8]) -> Result<String, RegistryError>;
}

/// Outcome of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub latest: String,
    pub history: String,
    pub timestamp: PublishTimestamp,
    /// Size of the published manifest
    pub bytes: usize,
    /// Hex SHA-256 of the published manifest
    pub sha256: String,
}

/// Publish a manifest, keying the history partition by the current time
pub fn publish(
    manifest_path: &Path,
    project: &str,
    environment: &str,
    destination: &dyn RegistryBackend,
) -> Result<PublishReceipt, RegistryError> {
    publish_at(manifest_path, project, environment, destination, PublishTimestamp::now())
}

/// Publish a manifest under an explicit history timestamp
///
/// Nothing is written unless the manifest can be read. Two publishes with
/// the same timestamp share a history partition and the later one wins.
pub fn publish_at(
    manifest_path: &Path,
    project: &str,
    environment: &str,
    destination: &dyn RegistryBackend,
    timestamp: PublishTimestamp,
) -> Result<PublishReceipt, RegistryError> {
    if !manifest_path.is_file() {
        return Err(RegistryError::ManifestNotFound(manifest_path.to_path_buf()));
    }
    let content = std::fs::read(manifest_path).map_err(|e| RegistryError::io(manifest_path, e))?;

    let latest = RegistryPartition::latest(project, environment);
    let history = RegistryPartition::history(project, environment, timestamp.clone());

    let latest_location = destination.write(&latest, &content)?;
    let history_location = destination.write(&history, &content)?;

    tracing::info!(
        backend = destination.name(),
        project,
        environment,
        %timestamp,
        latest = %latest_location,
        history = %history_location,
        "published manifest"
    );

    Ok(PublishReceipt {
        latest: latest_location,
        history: history_location,
        timestamp,
        bytes: content.len(),
        sha256: hex::encode(Sha256::digest(&content)),
    })
}

/// Pick the backend described by `config`
///
/// Remote mode needs a bucket; its absence is reported before any client
/// is built or any write is attempted.
pub fn destination_from_config(
    config: &RegistryConfig,
    local: bool,
) -> Result<Box<dyn RegistryBackend>, RegistryError> {
    if local {
        return Ok(Box::new(LocalRegistry::new(config.root.clone())));
    }

    let bucket = config
        .bucket
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| RegistryError::Configuration(format!(
            "S3 bucket required. Set --bucket or {} env var",
            meshline_core::config::BUCKET_ENV_VAR
        )))?;

    let sink = S3Sink::from_env(bucket)?;
    Ok(Box::new(ObjectRegistry::new(sink, config.key_prefix.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySink;

    #[test]
    fn missing_manifest_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ObjectRegistry::new(InMemorySink::new("b"), "registry");

        let err = publish(&dir.path().join("target/manifest.json"), "dbt_up", "prod", &registry)
            .unwrap_err();

        assert!(matches!(err, RegistryError::ManifestNotFound(_)));
        assert!(err.to_string().contains("dbt compile"));
        assert_eq!(registry.sink().object_count(), 0);
    }

    #[test]
    fn receipt_carries_digest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("manifest.json");
        std::fs::write(&manifest, b"{}").unwrap();

        let registry = ObjectRegistry::new(InMemorySink::new("b"), "registry");
        let ts = PublishTimestamp::parse("20240101T000000Z").unwrap();
        let receipt = publish_at(&manifest, "dbt_up", "prod", &registry, ts).unwrap();

        assert_eq!(receipt.bytes, 2);
        assert_eq!(
            receipt.sha256,
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
        assert_eq!(
            receipt.history,
            "s3://b/registry/dbt_up/prod/history/20240101T000000Z/manifest.json"
        );
    }

    #[test]
    fn remote_without_bucket_is_a_configuration_error() {
        let config = RegistryConfig::default();
        let err = destination_from_config(&config, false).err().unwrap();
        assert!(matches!(err, RegistryError::Configuration(msg) if msg.contains("DBT_MESH_BUCKET")));
    }

    #[test]
    fn blank_bucket_counts_as_missing() {
        let config = RegistryConfig {
            bucket: Some("   ".to_string()),
            ..RegistryConfig::default()
        };
        assert!(destination_from_config(&config, false).is_err());
    }

    #[test]
    fn local_mode_ignores_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let config = RegistryConfig {
            root: dir.path().to_path_buf(),
            ..RegistryConfig::default()
        };
        let backend = destination_from_config(&config, true).unwrap();
        assert_eq!(backend.name(), "local");
    }
}
