//! Cross-project reference detection
//!
//! A downstream project can point at an upstream model in two ways:
//! - dbt-loom injects the upstream model directly: `model.dbt_up.public_orders`
//! - native dbt sources wrap it: `source.dbt_down.dbt_up.public_orders`
//!
//! Each way is a [`ReferenceConvention`]. A reference is cross-project if
//! any convention matches it.

use std::collections::BTreeMap;
use std::fmt;

/// Parsed view of a manifest unique_id
///
/// `<resource_type>.<project>.<name>` or
/// `source.<project>.<source_name>.<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentifier<'a> {
    pub resource_type: &'a str,
    pub project: &'a str,
    /// Last dot-separated segment
    pub name: &'a str,
}

impl<'a> NodeIdentifier<'a> {
    /// Parse a unique_id; returns None if it has fewer than three segments
    pub fn parse(unique_id: &'a str) -> Option<Self> {
        let mut parts = unique_id.split('.');
        let resource_type = parts.next()?;
        let project = parts.next()?;
        let name = parts.last()?;

        Some(Self { resource_type, project, name })
    }
}

/// Ways a downstream manifest can reference an upstream project's model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceConvention {
    /// `model.<upstream>.<name>` (dbt-loom)
    UpstreamModel,

    /// `source.<project>.<upstream>.<name>` (native sources)
    UpstreamSource,
}

impl ReferenceConvention {
    /// Every convention, applied independently
    pub const ALL: &'static [ReferenceConvention] = &[
        ReferenceConvention::UpstreamModel,
        ReferenceConvention::UpstreamSource,
    ];

    /// Whether `unique_id` references `upstream` under this convention
    pub fn matches(&self, unique_id: &str, upstream: &str) -> bool {
        match self {
            Self::UpstreamModel => unique_id
                .strip_prefix("model.")
                .and_then(|rest| rest.strip_prefix(upstream))
                .is_some_and(|rest| rest.starts_with('.')),
            Self::UpstreamSource => {
                unique_id.starts_with("source.")
                    && unique_id.contains(&format!(".{upstream}."))
            }
        }
    }

    /// Convention matching `unique_id`, if any
    pub fn detect(unique_id: &str, upstream: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|convention| convention.matches(unique_id, upstream))
    }

    /// Whether any convention matches
    pub fn is_cross_project(unique_id: &str, upstream: &str) -> bool {
        Self::detect(unique_id, upstream).is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpstreamModel => "model",
            Self::UpstreamSource => "source",
        }
    }
}

impl fmt::Display for ReferenceConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downstream node -> upstream references it records
///
/// Keys iterate in sorted identifier order, not in the order the manifest
/// lists them, so reports and console output are stable across dbt runs.
/// Each reference list keeps first-seen order and never holds duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossProjectReferences {
    refs: BTreeMap<String, Vec<String>>,
}

impl CrossProjectReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the matching references out of `edges`
    ///
    /// Nodes with no matching reference are left out entirely.
    pub fn collect<'a, I, D>(edges: I, upstream: &str) -> Self
    where
        I: IntoIterator<Item = (&'a String, D)>,
        D: IntoIterator<Item = &'a String>,
    {
        let mut refs = Self::new();
        for (node_id, deps) in edges {
            for dep in deps {
                if ReferenceConvention::is_cross_project(dep, upstream) {
                    refs.insert(node_id, dep);
                }
            }
        }
        refs
    }

    /// Record one reference; returns false if it was already present
    pub fn insert(&mut self, node_id: &str, reference: &str) -> bool {
        let entry = self.refs.entry(node_id.to_string()).or_default();
        if entry.iter().any(|r| r == reference) {
            return false;
        }
        entry.push(reference.to_string());
        true
    }

    /// Union of `self` and `other`; `self`'s references come first
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (node_id, references) in &other.refs {
            for reference in references {
                merged.insert(node_id, reference);
            }
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Number of downstream nodes with at least one reference
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn get(&self, node_id: &str) -> Option<&[String]> {
        self.refs.get(node_id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.refs.iter()
    }

    /// Number of (node, reference) pairs
    pub fn edge_count(&self) -> usize {
        self.refs.values().map(Vec::len).sum()
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.refs
    }
}
