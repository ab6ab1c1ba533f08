//! Package source indexes and their registry

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::package::error::PackageError;

/// A package index packages are resolved from (an entry of `[[source]]` in Pipfile)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageSource {
    /// Symbolic name used by Pipfile entries to refer to this index
    pub name: String,
    pub url: String,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

fn default_verify_ssl() -> bool {
    true
}

impl PackageSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            verify_ssl: true,
        }
    }

    /// Create a source known only by its URL, deriving the symbolic name from the host
    ///
    /// Examples:
    /// - "https://pypi.org/simple" -> "pypi-org"
    /// - "https://user@mirror.example.com:8080/simple" -> "mirror-example-com"
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let name = host_of(&url)
            .filter(|host| !host.is_empty())
            .map(|host| host.replace('.', "-"))
            .unwrap_or_else(|| url.clone());

        Self {
            name,
            url,
            verify_ssl: true,
        }
    }
}

fn host_of(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split('/').next()?;
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    authority.split(':').next()
}

/// Source indexes declared by a Pipfile, keyed by their symbolic name
///
/// Deserializes from (and serializes to) the list form used in the
/// `_meta.sources` section of Pipfile.lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PackageSource>", into = "Vec<PackageSource>")]
pub struct SourceRegistry {
    sources: IndexMap<String, Arc<PackageSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, replacing any source previously registered under the same name
    pub fn insert(&mut self, source: PackageSource) -> Option<Arc<PackageSource>> {
        self.sources.insert(source.name.clone(), Arc::new(source))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<PackageSource>> {
        self.sources.get(name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PackageSource>> {
        self.sources.values()
    }

    /// Resolve the index a package entry refers to
    ///
    /// Pipenv does not explicitly assign an index to every package, so a
    /// missing index name resolves to `None` rather than an error. Even with a
    /// single configured source nothing is assigned implicitly, as hashes in
    /// Pipfile.lock may differ between indexes.
    pub fn resolve_index(
        &self,
        package_name: &str,
        index_name: Option<&str>,
    ) -> Result<Option<Arc<PackageSource>>, PackageError> {
        let Some(index_name) = index_name else {
            return Ok(None);
        };

        match self.get(index_name) {
            Some(source) => {
                debug!(
                    "Resolved index {} for package {} to {}",
                    index_name, package_name, source.url
                );
                Ok(Some(Arc::clone(source)))
            }
            None => Err(PackageError::Parse(format!(
                "Configured index {} for package {} not found in metadata",
                index_name, package_name
            ))),
        }
    }
}

impl FromIterator<PackageSource> for SourceRegistry {
    fn from_iter<I: IntoIterator<Item = PackageSource>>(iter: I) -> Self {
        let mut registry = Self::new();
        for source in iter {
            registry.insert(source);
        }
        registry
    }
}

impl From<Vec<PackageSource>> for SourceRegistry {
    fn from(sources: Vec<PackageSource>) -> Self {
        sources.into_iter().collect()
    }
}

impl From<SourceRegistry> for Vec<PackageSource> {
    fn from(registry: SourceRegistry) -> Self {
        registry
            .sources
            .into_values()
            .map(Arc::unwrap_or_clone)
            .collect()
    }
}
