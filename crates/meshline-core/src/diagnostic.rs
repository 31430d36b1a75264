//! Diagnostic codes for lineage validation
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Lineage outcomes
    /// parent_map records at least one upstream reference
    LineageValidated,

    /// Only depends_on records upstream references
    LineagePartial,

    /// No upstream references under any convention
    LineageMissing,

    // Manifest loading
    /// Manifest file does not exist
    ManifestNotFound,

    /// Manifest could not be read or parsed
    ManifestParseError,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LineageValidated => "LINEAGE_VALIDATED",
            Self::LineagePartial => "LINEAGE_PARTIAL",
            Self::LineageMissing => "LINEAGE_MISSING",
            Self::ManifestNotFound => "MANIFEST_NOT_FOUND",
            Self::ManifestParseError => "MANIFEST_PARSE_ERROR",
        }
    }

    /// Default severity for this code
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::LineageValidated => Severity::Info,
            Self::LineagePartial => Severity::Warn,
            Self::LineageMissing | Self::ManifestNotFound | Self::ManifestParseError => {
                Severity::Error
            }
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - passes, but should be reviewed
    Warn,

    /// Error - blocking issue that should fail CI
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Manifest the diagnostic refers to
    pub manifest: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            manifest: None,
        }
    }

    /// Create a diagnostic using the code's default severity
    pub fn from_code(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, code.default_severity(), message)
    }

    /// Set the manifest path
    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        // Ensure codes are stable strings
        assert_eq!(DiagnosticCode::LineageValidated.as_str(), "LINEAGE_VALIDATED");
        assert_eq!(DiagnosticCode::LineagePartial.as_str(), "LINEAGE_PARTIAL");
        assert_eq!(DiagnosticCode::ManifestNotFound.as_str(), "MANIFEST_NOT_FOUND");
    }

    #[test]
    fn partial_lineage_is_a_warning() {
        let diag = Diagnostic::from_code(DiagnosticCode::LineagePartial, "depends_on only");
        assert_eq!(diag.severity, Severity::Warn);

        let missing = Diagnostic::from_code(DiagnosticCode::LineageMissing, "nothing");
        assert_eq!(missing.severity, Severity::Error);
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::from_code(
            DiagnosticCode::LineageMissing,
            "no cross-project references found",
        )
        .with_manifest("dbt_down/target/manifest.json");

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("LINEAGE_MISSING"));
        assert!(json.contains("error"));
        assert!(json.contains("dbt_down/target/manifest.json"));
    }
}
