//! dbt artifact parsing and cross-project lineage validation
//!
//! This crate handles:
//! - Parsing manifest.json (dbt-generated artifacts)
//! - Recognizing cross-project references (dbt-loom models and native sources)
//! - Validating that a downstream manifest records lineage to an upstream project

pub mod manifest;
pub mod reference;
pub mod lineage;

pub use manifest::{Manifest, ManifestNode, DependsOn, ManifestMetadata, ManifestError};
pub use reference::{NodeIdentifier, ReferenceConvention, CrossProjectReferences};
pub use lineage::{LineageValidator, LineageOutcome, LineageValidation, BatchValidation, BatchEntry};
