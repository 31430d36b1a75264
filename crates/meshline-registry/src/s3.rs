//! Amazon S3 sink using the `object_store` crate
//!
//! Credentials and region come from the standard AWS environment:
//! - AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY / AWS_SESSION_TOKEN
//! - AWS_REGION (or AWS_DEFAULT_REGION)
//! - AWS_ENDPOINT for S3-compatible stores
//!
//! ## Usage
//!
//! ```rust,ignore
//! let sink = S3Sink::from_env("mesh-contracts")?;
//! let registry = ObjectRegistry::new(sink, "registry");
//! ```
//!
//! Requires the `s3` feature.

use crate::error::RegistryError;
use crate::sink::ObjectSink;

#[cfg(feature = "s3")]
use object_store::{
    aws::{AmazonS3, AmazonS3Builder},
    path::Path as ObjectPath,
    Attribute, Attributes, ObjectStore, PutOptions, PutPayload,
};

#[cfg(not(feature = "s3"))]
const NOT_COMPILED: &str = "S3 support not compiled. Rebuild with: cargo build --features s3";

/// S3 object sink
///
/// Puts are blocking: each one runs to completion on a private
/// current-thread runtime.
pub struct S3Sink {
    bucket: String,

    #[cfg(feature = "s3")]
    store: AmazonS3,

    #[cfg(feature = "s3")]
    runtime: tokio::runtime::Runtime,
}

impl S3Sink {
    /// Create a sink for `bucket` using credentials from the environment
    #[cfg(feature = "s3")]
    pub fn from_env(bucket: impl Into<String>) -> Result<Self, RegistryError> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(RegistryError::Configuration("S3 bucket name is empty".to_string()));
        }

        let store = AmazonS3Builder::from_env()
            .with_bucket_name(&bucket)
            .build()
            .map_err(|e| RegistryError::Configuration(format!(
                "Failed to configure S3 client for bucket '{}': {}",
                bucket, e
            )))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RegistryError::Configuration(format!(
                "Failed to start S3 runtime: {}",
                e
            )))?;

        Ok(Self {
            bucket,
            store,
            runtime,
        })
    }

    /// Create sink without s3 feature (returns error)
    #[cfg(not(feature = "s3"))]
    pub fn from_env(bucket: impl Into<String>) -> Result<Self, RegistryError> {
        let _ = bucket.into();
        Err(RegistryError::Configuration(NOT_COMPILED.to_string()))
    }
}

impl ObjectSink for S3Sink {
    fn name(&self) -> &'static str {
        "S3"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[cfg(feature = "s3")]
    fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), RegistryError> {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.runtime
            .block_on(self.store.put_opts(
                &ObjectPath::from(key),
                PutPayload::from(body.to_vec()),
                options,
            ))
            .map(|_| ())
            .map_err(|e| RegistryError::Storage(format!(
                "Failed to write s3://{}/{}: {}",
                self.bucket, key, e
            )))
    }

    #[cfg(not(feature = "s3"))]
    fn put_object(&self, _key: &str, _body: &[u8], _content_type: &str) -> Result<(), RegistryError> {
        Err(RegistryError::Configuration(NOT_COMPILED.to_string()))
    }
}
