//! Boundary shapes of package entries in Pipfile and Pipfile.lock

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::VCS_KEYS;

/// A package entry as stated in Pipfile
///
/// Pipfile holds either a plain version string:
///   requests = "==2.31.0"
/// or a table with additional configuration:
///   requests = {version = "==2.31.0", index = "pypi"}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestEntry {
    Bare(String),
    Detailed(DetailedManifestEntry),
}

impl From<&str> for ManifestEntry {
    fn from(version: &str) -> Self {
        ManifestEntry::Bare(version.to_string())
    }
}

impl From<String> for ManifestEntry {
    fn from(version: String) -> Self {
        ManifestEntry::Bare(version)
    }
}

/// Table form of a Pipfile entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedManifestEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<String>,
    /// Keys not understood by this crate (extras, editable, VCS references, ...)
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl DetailedManifestEntry {
    /// Returns the version control system the entry points at, if any
    pub fn vcs(&self) -> Option<&'static str> {
        VCS_KEYS
            .into_iter()
            .find(|key| self.extra.contains_key(*key))
    }
}

/// A package entry as stated in Pipfile.lock
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockEntry {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub hashes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}
