//! Object storage sink trait and the registry backend built on it

use crate::error::RegistryError;
use crate::partition::RegistryPartition;
use crate::publisher::RegistryBackend;

/// Content type recorded for published manifests
pub const MANIFEST_CONTENT_TYPE: &str = "application/json";

/// Trait for object stores that manifests can be written to
///
/// Implementations are bound to a single bucket.
pub trait ObjectSink: Send + Sync {
    /// Get the sink name (e.g., "S3", "Memory")
    fn name(&self) -> &'static str;

    /// Bucket every object is written into
    fn bucket(&self) -> &str;

    /// URL scheme used when rendering locations
    fn scheme(&self) -> &'static str {
        "s3"
    }

    /// Store `body` at `key`, replacing any existing object
    fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), RegistryError>;
}

/// Registry backend addressed by bucket + key
pub struct ObjectRegistry<S: ObjectSink> {
    sink: S,
    key_prefix: String,
}

impl<S: ObjectSink> ObjectRegistry<S> {
    pub fn new(sink: S, key_prefix: impl Into<String>) -> Self {
        Self {
            sink,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn key_for(&self, partition: &RegistryPartition) -> String {
        partition.object_key(&self.key_prefix)
    }
}

impl<S: ObjectSink> RegistryBackend for ObjectRegistry<S> {
    fn name(&self) -> &'static str {
        self.sink.name()
    }

    fn location(&self, partition: &RegistryPartition) -> String {
        format!(
            "{}://{}/{}",
            self.sink.scheme(),
            self.sink.bucket(),
            self.key_for(partition)
        )
    }

    fn write(&self, partition: &RegistryPartition, content: &[u8]) -> Result<String, RegistryError> {
        let key = self.key_for(partition);
        self.sink.put_object(&key, content, MANIFEST_CONTENT_TYPE)?;
        tracing::debug!(sink = self.sink.name(), bucket = self.sink.bucket(), %key, bytes = content.len(), "put object");
        Ok(self.location(partition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySink;

    #[test]
    fn location_uses_bucket_and_prefix() {
        let registry = ObjectRegistry::new(InMemorySink::new("mesh-bucket"), "registry");
        let latest = RegistryPartition::latest("dbt_up", "prod");

        assert_eq!(
            registry.location(&latest),
            "s3://mesh-bucket/registry/dbt_up/prod/latest/manifest.json"
        );
    }

    #[test]
    fn write_stores_json_content_type() {
        let registry = ObjectRegistry::new(InMemorySink::new("b"), "registry");
        let latest = RegistryPartition::latest("dbt_up", "prod");

        registry.write(&latest, b"{}").unwrap();

        let key = registry.key_for(&latest);
        assert_eq!(registry.sink().get_object(&key).unwrap(), b"{}");
        assert_eq!(
            registry.sink().content_type(&key).as_deref(),
            Some(MANIFEST_CONTENT_TYPE)
        );
    }
}
