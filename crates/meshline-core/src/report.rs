//! Lineage report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::diagnostic::{Diagnostic, DiagnosticCode};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Outcome of validating a single manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestResult {
    /// Path of the manifest that was checked
    pub manifest: String,

    /// Project label shown in the summary table
    pub project: String,

    /// Whether the manifest passed
    pub passed: bool,

    /// Diagnostic describing the outcome
    pub diagnostic: Diagnostic,

    /// Downstream node -> upstream references
    #[serde(default)]
    pub references: BTreeMap<String, Vec<String>>,
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of manifests checked
    pub checked: usize,

    /// Manifests that passed (including partial lineage)
    pub passed: usize,

    /// Manifests that failed or could not be loaded
    pub failed: usize,

    /// Passing manifests whose lineage was only declared
    pub partial: usize,
}

/// Lineage report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Upstream project the references were matched against
    pub upstream: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// Per-manifest results, in evaluation order
    pub results: Vec<ManifestResult>,
}

impl LineageReport {
    /// Create a new empty report
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            upstream: upstream.into(),
            summary: ReportSummary::default(),
            results: Vec::new(),
        }
    }

    /// Add a manifest result to the report
    pub fn add_result(&mut self, result: ManifestResult) {
        self.summary.checked += 1;
        if result.passed {
            self.summary.passed += 1;
            if result.diagnostic.code == DiagnosticCode::LineagePartial {
                self.summary.partial += 1;
            }
        } else {
            self.summary.failed += 1;
        }
        self.results.push(result);
    }

    /// True only if every manifest passed
    ///
    /// An empty report does not pass: nothing was validated.
    pub fn all_passed(&self) -> bool {
        self.summary.checked > 0 && self.summary.failed == 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Diagnostic;

    fn result(passed: bool, code: DiagnosticCode) -> ManifestResult {
        ManifestResult {
            manifest: "dbt_down/target/manifest.json".to_string(),
            project: "dbt_down".to_string(),
            passed,
            diagnostic: Diagnostic::from_code(code, "msg"),
            references: BTreeMap::new(),
        }
    }

    #[test]
    fn empty_report() {
        let report = LineageReport::new("dbt_up");
        assert_eq!(report.version, ReportVersion::CURRENT);
        assert_eq!(report.summary.checked, 0);
        assert!(!report.all_passed());
    }

    #[test]
    fn summary_counts_partial_as_passed() {
        let mut report = LineageReport::new("dbt_up");
        report.add_result(result(true, DiagnosticCode::LineageValidated));
        report.add_result(result(true, DiagnosticCode::LineagePartial));

        assert_eq!(report.summary.passed, 2);
        assert_eq!(report.summary.partial, 1);
        assert!(report.all_passed());
    }

    #[test]
    fn one_failure_fails_the_report() {
        let mut report = LineageReport::new("dbt_up");
        report.add_result(result(true, DiagnosticCode::LineageValidated));
        report.add_result(result(false, DiagnosticCode::ManifestNotFound));

        assert_eq!(report.summary.failed, 1);
        assert!(!report.all_passed());
    }

    #[test]
    fn report_serialization() {
        let report = LineageReport::new("dbt_up");
        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"results\""));
        assert!(json.contains("\"dbt_up\""));
    }

    #[test]
    fn save_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut report = LineageReport::new("dbt_up");
        report.add_result(result(true, DiagnosticCode::LineageValidated));
        report.save_to_file(&path).unwrap();

        let loaded: LineageReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        pretty_assertions::assert_eq!(loaded, report);
    }
}
