//! Manifest registry for dbt mesh
//!
//! Publishes a compiled manifest.json into a partitioned registry:
//! - `latest/`: the current contract, overwritten on every publish
//! - `history/<timestamp>/`: an audit trail, one partition per publish
//!
//! Two backends share the same partition layout:
//! - [`LocalRegistry`] writes to directories under a registry root
//! - [`ObjectRegistry`] writes to an [`ObjectSink`] addressed by bucket + key
//!
//! ## Features
//!
//! - `s3` - Amazon S3 sink ([`S3Sink`]) via the `object_store` crate
//!
//! ## Example
//!
//! ```rust,ignore
//! use meshline_registry::{publish, LocalRegistry};
//!
//! let registry = LocalRegistry::new("../registry");
//! let receipt = publish(Path::new("target/manifest.json"), "dbt_up", "prod", &registry)?;
//! println!("{}", receipt.latest);
//! ```

pub mod error;
pub mod partition;
pub mod sink;
pub mod memory;
pub mod s3;
pub mod local;
pub mod publisher;

pub use error::RegistryError;
pub use partition::{PartitionKind, PublishTimestamp, RegistryPartition, MANIFEST_FILE_NAME};
pub use sink::{ObjectSink, ObjectRegistry};
pub use memory::InMemorySink;
pub use s3::S3Sink;
pub use local::LocalRegistry;
pub use publisher::{publish, publish_at, destination_from_config, PublishReceipt, RegistryBackend};
