//! meshline core
//!
//! Shared domain types for the dbt mesh tooling: configuration,
//! stable diagnostic codes and the versioned lineage report.
//! Never rename diagnostic codes - they are part of the public API.

pub mod diagnostic;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use report::{LineageReport, ManifestResult, ReportSummary, ReportVersion};
pub use config::{Config, ConfigError, LineageConfig, RegistryConfig};
