//! Integration tests for registry publishing
//!
//! These run entirely offline: the local backend writes into a temporary
//! directory and the remote backend uses the in-memory sink.
//!
//! ```bash
//! cargo test -p meshline-registry --test integration_tests
//! ```

use meshline_registry::{
    publish, publish_at, InMemorySink, LocalRegistry, ObjectRegistry, PublishTimestamp,
    RegistryBackend, RegistryPartition,
};
use std::path::{Path, PathBuf};

// =============================================================================
// Helper Functions
// =============================================================================

const MANIFEST_V1: &str = r#"{"metadata": {"project_name": "dbt_up"}, "nodes": {"model.dbt_up.public_orders": {"resource_type": "model", "access": "public"}}}"#;
const MANIFEST_V2: &str = r#"{"metadata": {"project_name": "dbt_up"}, "nodes": {}}"#;

fn write_manifest(dir: &Path, content: &str) -> PathBuf {
    let target = dir.join("target");
    std::fs::create_dir_all(&target).unwrap();
    let path = target.join("manifest.json");
    std::fs::write(&path, content).unwrap();
    path
}

fn ts(value: &str) -> PublishTimestamp {
    PublishTimestamp::parse(value).unwrap()
}

// =============================================================================
// Local backend
// =============================================================================

#[test]
fn local_publish_writes_latest_and_history() {
    let project = tempfile::tempdir().unwrap();
    let registry_dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(project.path(), MANIFEST_V1);
    let registry = LocalRegistry::new(registry_dir.path());

    let receipt = publish(&manifest, "dbt_up", "prod", &registry).unwrap();

    assert_eq!(std::fs::read_to_string(&receipt.latest).unwrap(), MANIFEST_V1);
    assert_eq!(std::fs::read_to_string(&receipt.history).unwrap(), MANIFEST_V1);
    assert!(receipt.history.contains(receipt.timestamp.as_str()));
    assert_eq!(registry.history("dbt_up", "prod").unwrap(), vec![receipt.timestamp]);
}

#[test]
fn republishing_adds_history_and_overwrites_latest() {
    let project = tempfile::tempdir().unwrap();
    let registry_dir = tempfile::tempdir().unwrap();
    let registry = LocalRegistry::new(registry_dir.path());

    let manifest = write_manifest(project.path(), MANIFEST_V1);
    let first = publish_at(&manifest, "dbt_up", "prod", &registry, ts("20240101T000000Z")).unwrap();

    let manifest = write_manifest(project.path(), MANIFEST_V2);
    let second = publish_at(&manifest, "dbt_up", "prod", &registry, ts("20240101T000001Z")).unwrap();

    assert_ne!(first.history, second.history);
    assert_eq!(first.latest, second.latest);
    assert_eq!(
        registry.history("dbt_up", "prod").unwrap(),
        vec![ts("20240101T000000Z"), ts("20240101T000001Z")]
    );

    assert_eq!(registry.read_latest("dbt_up", "prod").unwrap(), MANIFEST_V2.as_bytes());
    assert_eq!(std::fs::read_to_string(&first.history).unwrap(), MANIFEST_V1);
    assert_eq!(std::fs::read_to_string(&second.history).unwrap(), MANIFEST_V2);
}

#[test]
fn environments_are_separate_partitions() {
    let project = tempfile::tempdir().unwrap();
    let registry_dir = tempfile::tempdir().unwrap();
    let registry = LocalRegistry::new(registry_dir.path());
    let manifest = write_manifest(project.path(), MANIFEST_V1);

    let dev = publish_at(&manifest, "dbt_up", "dev", &registry, ts("20240101T000000Z")).unwrap();
    let prod = publish_at(&manifest, "dbt_up", "prod", &registry, ts("20240101T000000Z")).unwrap();

    assert_ne!(dev.latest, prod.latest);
    assert_eq!(registry.history("dbt_up", "dev").unwrap().len(), 1);
    assert_eq!(registry.history("dbt_up", "prod").unwrap().len(), 1);
}

// =============================================================================
// Object backend
// =============================================================================

#[test]
fn object_publish_writes_both_keys() {
    let project = tempfile::tempdir().unwrap();
    let manifest = write_manifest(project.path(), MANIFEST_V1);
    let registry = ObjectRegistry::new(InMemorySink::new("mesh-contracts"), "registry");

    let receipt = publish_at(&manifest, "dbt_up", "prod", &registry, ts("20240615T101500Z")).unwrap();

    assert_eq!(
        receipt.latest,
        "s3://mesh-contracts/registry/dbt_up/prod/latest/manifest.json"
    );
    assert_eq!(
        receipt.history,
        "s3://mesh-contracts/registry/dbt_up/prod/history/20240615T101500Z/manifest.json"
    );
    assert_eq!(
        registry.sink().keys(),
        vec![
            "registry/dbt_up/prod/history/20240615T101500Z/manifest.json".to_string(),
            "registry/dbt_up/prod/latest/manifest.json".to_string(),
        ]
    );
}

#[test]
fn object_republish_keeps_one_latest() {
    let project = tempfile::tempdir().unwrap();
    let registry = ObjectRegistry::new(InMemorySink::new("b"), "registry");

    let manifest = write_manifest(project.path(), MANIFEST_V1);
    publish_at(&manifest, "dbt_up", "prod", &registry, ts("20240101T000000Z")).unwrap();
    let manifest = write_manifest(project.path(), MANIFEST_V2);
    publish_at(&manifest, "dbt_up", "prod", &registry, ts("20240101T000001Z")).unwrap();

    assert_eq!(registry.sink().object_count(), 3);
    let latest_key = registry.key_for(&RegistryPartition::latest("dbt_up", "prod"));
    assert_eq!(registry.sink().get_object(&latest_key).unwrap(), MANIFEST_V2.as_bytes());
}

#[test]
fn storage_failure_is_fatal() {
    let project = tempfile::tempdir().unwrap();
    let manifest = write_manifest(project.path(), MANIFEST_V1);
    let registry = ObjectRegistry::new(InMemorySink::new("b").with_put_failure(), "registry");

    let err = publish(&manifest, "dbt_up", "prod", &registry).unwrap_err();
    assert!(err.to_string().contains("Storage error"));
}

// =============================================================================
// Cross-backend
// =============================================================================

#[test]
fn backends_publish_identical_content() {
    let project = tempfile::tempdir().unwrap();
    let registry_dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(project.path(), MANIFEST_V1);

    let local = LocalRegistry::new(registry_dir.path());
    let remote = ObjectRegistry::new(InMemorySink::new("b"), "registry");
    let at = ts("20240101T000000Z");

    let backends: [&dyn RegistryBackend; 2] = [&local, &remote];
    let receipts: Vec<_> = backends
        .iter()
        .map(|backend| publish_at(&manifest, "dbt_up", "prod", *backend, at.clone()).unwrap())
        .collect();

    assert_eq!(receipts[0].sha256, receipts[1].sha256);
    assert_eq!(receipts[0].bytes, receipts[1].bytes);

    let history = RegistryPartition::history("dbt_up", "prod", at);
    let local_bytes = std::fs::read(local.path_for(&history)).unwrap();
    let remote_bytes = remote.sink().get_object(&remote.key_for(&history)).unwrap();
    assert_eq!(local_bytes, remote_bytes);
}
