//! Cross-project lineage validation
//!
//! Checks that a downstream manifest records dependency edges back to an
//! upstream project. Two sources are consulted separately:
//!
//! - `parent_map`: ancestry resolved by dbt. A match here is proof the edge
//!   was wired into the DAG.
//! - `depends_on`: what each node declared. A match here alone is only
//!   partial lineage.
//!
//! Both are kept as separate results and merged at the end so that the
//! validated/partial distinction is always reproducible.

use crate::manifest::{Manifest, ManifestError};
use crate::reference::CrossProjectReferences;
use meshline_core::{Diagnostic, DiagnosticCode, ManifestResult};
use std::path::{Path, PathBuf};

/// Classification of a single validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineageOutcome {
    /// parent_map records upstream references
    Validated,

    /// Only depends_on records upstream references
    Partial,

    /// No upstream references anywhere
    Missing,
}

impl LineageOutcome {
    /// PASS/FAIL; partial lineage passes
    pub fn passed(&self) -> bool {
        !matches!(self, Self::Missing)
    }

    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::Validated => DiagnosticCode::LineageValidated,
            Self::Partial => DiagnosticCode::LineagePartial,
            Self::Missing => DiagnosticCode::LineageMissing,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Validated => "lineage validated via parent_map",
            Self::Partial => {
                "partial lineage: only declared dependencies matched, not resolved ancestry"
            }
            Self::Missing => "no cross-project references found",
        }
    }

    fn classify(parent_refs: &CrossProjectReferences, all_refs: &CrossProjectReferences) -> Self {
        if all_refs.is_empty() {
            Self::Missing
        } else if !parent_refs.is_empty() {
            Self::Validated
        } else {
            Self::Partial
        }
    }
}

/// Result of validating one loaded manifest
#[derive(Debug, Clone, PartialEq)]
pub struct LineageValidation {
    /// metadata.project_name of the validated manifest
    pub project_name: String,

    /// Upstream project that was looked for
    pub upstream: String,

    /// Matches found in parent_map
    pub parent_refs: CrossProjectReferences,

    /// Matches found in depends_on
    pub node_refs: CrossProjectReferences,

    /// Union of both
    pub all_refs: CrossProjectReferences,

    pub outcome: LineageOutcome,
}

impl LineageValidation {
    pub fn passed(&self) -> bool {
        self.outcome.passed()
    }

    pub fn diagnostic(&self) -> Diagnostic {
        let message = match self.outcome {
            LineageOutcome::Missing => format!(
                "{} (no references to '{}' in parent_map or depends_on)",
                self.outcome.message(),
                self.upstream
            ),
            _ => self.outcome.message().to_string(),
        };
        Diagnostic::from_code(self.outcome.code(), message)
    }
}

/// Validates manifests against one upstream project
#[derive(Debug, Clone)]
pub struct LineageValidator {
    upstream: String,
}

impl LineageValidator {
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into(),
        }
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Load a manifest from disk and validate it
    pub fn validate_file(&self, path: &Path) -> Result<LineageValidation, ManifestError> {
        let manifest = Manifest::from_file(path)?;
        tracing::debug!(path = %path.display(), project = manifest.project_name(), "loaded manifest");
        Ok(self.validate(&manifest))
    }

    /// Validate an already loaded manifest
    pub fn validate(&self, manifest: &Manifest) -> LineageValidation {
        let parent_refs = self.refs_from_parent_map(manifest);
        let node_refs = self.refs_from_depends_on(manifest);
        let all_refs = parent_refs.merge(&node_refs);
        let outcome = LineageOutcome::classify(&parent_refs, &all_refs);

        tracing::debug!(
            upstream = %self.upstream,
            parent_map_nodes = parent_refs.len(),
            depends_on_nodes = node_refs.len(),
            merged_nodes = all_refs.len(),
            ?outcome,
            "classified lineage"
        );

        if outcome == LineageOutcome::Partial {
            tracing::warn!(
                project = manifest.project_name(),
                upstream = %self.upstream,
                "depends_on references upstream but parent_map does not"
            );
        }

        LineageValidation {
            project_name: manifest.project_name().to_string(),
            upstream: self.upstream.clone(),
            parent_refs,
            node_refs,
            all_refs,
            outcome,
        }
    }

    /// Upstream references in dbt's resolved ancestry
    pub fn refs_from_parent_map(&self, manifest: &Manifest) -> CrossProjectReferences {
        CrossProjectReferences::collect(&manifest.parent_map, &self.upstream)
    }

    /// Upstream references in each node's declared dependencies
    pub fn refs_from_depends_on(&self, manifest: &Manifest) -> CrossProjectReferences {
        CrossProjectReferences::collect(
            manifest
                .nodes
                .iter()
                .map(|(id, node)| (id, &node.depends_on.nodes)),
            &self.upstream,
        )
    }

    /// Validate several manifests one after another
    ///
    /// A manifest that cannot be loaded fails on its own; the rest are
    /// still evaluated.
    pub fn validate_batch<P: AsRef<Path>>(&self, paths: &[P]) -> BatchValidation {
        let entries = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let result = self.validate_file(path);
                if let Err(e) = &result {
                    tracing::warn!(path = %path.display(), error = %e, "manifest could not be validated");
                }
                BatchEntry {
                    path: path.to_path_buf(),
                    result,
                }
            })
            .collect();

        BatchValidation { entries }
    }
}

/// One manifest's result within a batch
#[derive(Debug)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub result: Result<LineageValidation, ManifestError>,
}

impl BatchEntry {
    pub fn passed(&self) -> bool {
        matches!(&self.result, Ok(validation) if validation.passed())
    }

    /// Project label: the directory holding `target/`, else "unknown"
    pub fn project_label(&self) -> String {
        let parent = self.path.parent();
        match parent.and_then(|p| p.file_name()) {
            Some(dir) if dir == "target" => parent
                .and_then(Path::parent)
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string()),
            _ => "unknown".to_string(),
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        let diagnostic = match &self.result {
            Ok(validation) => validation.diagnostic(),
            Err(e @ ManifestError::NotFound(_)) => {
                Diagnostic::from_code(DiagnosticCode::ManifestNotFound, e.to_string())
            }
            Err(e) => Diagnostic::from_code(DiagnosticCode::ManifestParseError, e.to_string()),
        };
        diagnostic.with_manifest(self.path.display().to_string())
    }

    /// Report row for this entry
    pub fn to_result(&self) -> ManifestResult {
        ManifestResult {
            manifest: self.path.display().to_string(),
            project: self.project_label(),
            passed: self.passed(),
            diagnostic: self.diagnostic(),
            references: self
                .result
                .as_ref()
                .map(|v| v.all_refs.clone().into_map())
                .unwrap_or_default(),
        }
    }
}

/// Results of a batch run, in input order
#[derive(Debug)]
pub struct BatchValidation {
    pub entries: Vec<BatchEntry>,
}

impl BatchValidation {
    /// Logical AND of every entry; an empty batch does not pass
    pub fn all_passed(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(BatchEntry::passed)
    }
}
