//! In-memory object sink
//!
//! Stores objects in a map instead of a real bucket. It's useful for:
//! - Unit testing the publish flow without credentials
//! - Dry runs of a remote publish
//! - Simulating storage failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meshline_registry::{InMemorySink, ObjectRegistry, publish};
//!
//! let registry = ObjectRegistry::new(InMemorySink::new("mesh-bucket"), "registry");
//! publish(manifest_path, "dbt_up", "prod", &registry)?;
//!
//! let body = registry.sink().get_object("registry/dbt_up/prod/latest/manifest.json");
//! ```

use crate::error::RegistryError;
use crate::sink::ObjectSink;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
}

/// In-memory object sink
///
/// Clones share the same underlying storage.
#[derive(Debug, Clone)]
pub struct InMemorySink {
    bucket: String,

    /// Objects by key
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,

    /// Simulate storage failure on every put
    fail_puts: bool,
}

impl InMemorySink {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            fail_puts: false,
        }
    }

    /// Configure to fail every put
    pub fn with_put_failure(mut self) -> Self {
        self.fail_puts = true;
        self
    }

    /// Body stored at `key`
    pub fn get_object(&self, key: &str) -> Option<Vec<u8>> {
        self.read(|objects| objects.get(key).map(|o| o.body.clone()))
    }

    /// Content type stored at `key`
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.read(|objects| objects.get(key).map(|o| o.content_type.clone()))
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.read(|objects| objects.keys().cloned().collect())
    }

    pub fn object_count(&self) -> usize {
        self.read(BTreeMap::len)
    }

    fn read<T>(&self, f: impl FnOnce(&BTreeMap<String, StoredObject>) -> T) -> T {
        // A poisoned lock still holds consistent data: puts are single inserts.
        match self.objects.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

impl ObjectSink for InMemorySink {
    fn name(&self) -> &'static str {
        "Memory"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), RegistryError> {
        if self.fail_puts {
            return Err(RegistryError::Storage(format!(
                "simulated failure writing {}/{}",
                self.bucket, key
            )));
        }

        let mut objects = self
            .objects
            .write()
            .map_err(|_| RegistryError::Storage("in-memory sink lock poisoned".to_string()))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
