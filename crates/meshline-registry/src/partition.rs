//! Registry partition layout
//!
//! ```text
//! <project>/<env>/latest/manifest.json
//! <project>/<env>/history/<YYYYMMDDTHHMMSSZ>/manifest.json
//! ```

use crate::error::RegistryError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// File name of the manifest inside every partition
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// UTC publish time at second precision
///
/// The string form sorts lexically in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublishTimestamp(String);

impl PublishTimestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Parse a `YYYYMMDDTHHMMSSZ` string
    pub fn parse(value: &str) -> Result<Self, RegistryError> {
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .map(|naive| Self::from_datetime(naive.and_utc()))
            .map_err(|_| RegistryError::InvalidTimestamp(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublishTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of registry partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    /// Overwritten on every publish
    Latest,

    /// Write-once, keyed by publish timestamp
    History,
}

impl PartitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::History => "history",
        }
    }
}

/// A storage location for one copy of a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPartition {
    pub project: String,
    pub environment: String,
    pub kind: PartitionKind,
    /// Set only for history partitions
    pub timestamp: Option<PublishTimestamp>,
}

impl RegistryPartition {
    pub fn latest(project: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            environment: environment.into(),
            kind: PartitionKind::Latest,
            timestamp: None,
        }
    }

    pub fn history(
        project: impl Into<String>,
        environment: impl Into<String>,
        timestamp: PublishTimestamp,
    ) -> Self {
        Self {
            project: project.into(),
            environment: environment.into(),
            kind: PartitionKind::History,
            timestamp: Some(timestamp),
        }
    }

    /// Path segments up to and including the partition directory
    fn segments(&self) -> Vec<&str> {
        let mut segments = vec![
            self.project.as_str(),
            self.environment.as_str(),
            self.kind.as_str(),
        ];
        if let Some(ts) = &self.timestamp {
            segments.push(ts.as_str());
        }
        segments
    }

    /// Manifest path relative to a local registry root
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.segments().into_iter().collect();
        path.push(MANIFEST_FILE_NAME);
        path
    }

    /// Object key under `prefix`
    pub fn object_key(&self, prefix: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let prefix = prefix.trim_matches('/');
        if !prefix.is_empty() {
            parts.push(prefix);
        }
        parts.extend(self.segments());
        parts.push(MANIFEST_FILE_NAME);
        parts.join("/")
    }
}
