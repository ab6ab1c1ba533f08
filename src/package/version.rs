//! A single package version as described by a Pipfile or Pipfile.lock entry

use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use pep508_rs::pep440_rs::VersionSpecifiers;
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{LOCKED_PREFIX, NEGATED_PREFIX};
use crate::package::entry::{DetailedManifestEntry, LockEntry, ManifestEntry};
use crate::package::error::PackageError;
use crate::package::model::PersistedPackage;
use crate::package::semver::{
    parse_semantic_version, parse_version_specification, specification_contains,
};
use crate::source::{PackageSource, SourceRegistry};

/// A package version of an application stack
///
/// The parsed semantic version and version specification are computed on
/// first use and cached. `version` is only changed through methods that
/// drop both caches.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    name: String,
    version: String,
    develop: bool,
    index: Option<Arc<PackageSource>>,
    hashes: Vec<String>,
    markers: Option<String>,
    semantic_version: OnceCell<Version>,
    version_spec: OnceCell<VersionSpecifiers>,
}

/// Constructor-relevant fields of a [`PackageVersion`], without cached state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersionRecord {
    pub name: String,
    pub version: String,
    pub develop: bool,
    pub index: Option<PackageSource>,
    pub hashes: Vec<String>,
    pub markers: Option<String>,
}

impl PackageVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>, develop: bool) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            develop,
            index: None,
            hashes: Vec::new(),
            markers: None,
            semantic_version: OnceCell::new(),
            version_spec: OnceCell::new(),
        }
    }

    pub fn with_index(mut self, index: Arc<PackageSource>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_hashes(mut self, hashes: Vec<String>) -> Self {
        self.hashes = hashes;
        self
    }

    pub fn with_markers(mut self, markers: impl Into<String>) -> Self {
        self.markers = Some(markers.into());
        self
    }

    /// Construct a package version from its Pipfile entry
    pub fn from_manifest_entry(
        name: &str,
        entry: ManifestEntry,
        develop: bool,
        sources: &SourceRegistry,
    ) -> Result<Self, PackageError> {
        debug!("Parsing entry in Pipfile for package {}: {:?}", name, entry);

        let (version, index_name, markers) = match entry {
            ManifestEntry::Bare(version) => (version, None, None),
            ManifestEntry::Detailed(detailed) => {
                if let Some(vcs) = detailed.vcs() {
                    return Err(PackageError::UnsupportedConfiguration(format!(
                        "Package {} uses a version control system ({}) instead of package index",
                        name, vcs
                    )));
                }

                let DetailedManifestEntry {
                    version,
                    index,
                    markers,
                    extra,
                } = detailed;

                let version = version.ok_or_else(|| {
                    PackageError::Parse(format!(
                        "Package {} has no version configured in the Pipfile entry",
                        name
                    ))
                })?;

                if !extra.is_empty() {
                    warn!("Unparsed part of Pipfile for package {}: {:?}", name, extra);
                }

                (version, index, markers)
            }
        };

        let index = sources.resolve_index(name, index_name.as_deref())?;

        Ok(Self {
            index,
            markers,
            ..Self::new(name, version, develop)
        })
    }

    /// Construct a package version from its Pipfile.lock entry
    pub fn from_lock_entry(
        name: &str,
        entry: LockEntry,
        develop: bool,
        sources: &SourceRegistry,
    ) -> Result<Self, PackageError> {
        debug!("Parsing entry in Pipfile.lock for package {}: {:?}", name, entry);

        if entry.version.is_empty() || entry.hashes.is_empty() {
            return Err(PackageError::Parse(format!(
                "Package {} has missing or empty configuration in the locked entry: {:?}",
                name, entry
            )));
        }

        let LockEntry {
            version,
            hashes,
            markers,
            index,
            extra,
        } = entry;

        let index = sources.resolve_index(name, index.as_deref())?;

        if !extra.is_empty() {
            warn!(
                "Unused entries when parsing Pipfile.lock for package {}: {:?}",
                name, extra
            );
        }

        Ok(Self {
            index,
            hashes,
            markers,
            ..Self::new(name, version, develop)
        })
    }

    /// Construct a package version from a persisted resolution result
    ///
    /// Persisted results carry no hashes; the index is known by its URL only.
    pub fn from_persisted_model<M: PersistedPackage + ?Sized>(model: &M, develop: bool) -> Self {
        Self::new(model.package_name(), model.package_version(), develop)
            .with_index(Arc::new(PackageSource::from_url(model.index_url())))
    }

    pub fn from_record(record: PackageVersionRecord) -> Self {
        Self {
            index: record.index.map(Arc::new),
            hashes: record.hashes,
            markers: record.markers,
            ..Self::new(record.name, record.version, record.develop)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn develop(&self) -> bool {
        self.develop
    }

    pub fn index(&self) -> Option<&Arc<PackageSource>> {
        self.index.as_ref()
    }

    pub fn hashes(&self) -> &[String] {
        &self.hashes
    }

    pub fn markers(&self) -> Option<&str> {
        self.markers.as_deref()
    }

    /// Replace the version, dropping cached parse results
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
        self.invalidate_caches();
    }

    fn invalidate_caches(&mut self) {
        self.semantic_version = OnceCell::new();
        self.version_spec = OnceCell::new();
    }

    /// Check if the package is locked to a specific version
    pub fn is_locked(&self) -> bool {
        self.version.starts_with(LOCKED_PREFIX)
    }

    /// Locked version without the `==` prefix
    pub fn locked_version(&self) -> Result<&str, PackageError> {
        self.version.strip_prefix(LOCKED_PREFIX).ok_or_else(|| {
            PackageError::Internal(format!(
                "Requested locked version for {} but package has no locked version {}",
                self.name, self.version
            ))
        })
    }

    /// Semantic version of the locked version
    pub fn semantic_version(&self) -> Result<&Version, PackageError> {
        if let Some(version) = self.semantic_version.get() {
            return Ok(version);
        }

        if !self.is_locked() {
            return Err(PackageError::Internal(format!(
                "Cannot get semantic version for not-locked package {} in version {}",
                self.name, self.version
            )));
        }

        let parsed = parse_semantic_version(self.locked_version()?, Some(&self.name));
        Ok(self.semantic_version.get_or_init(|| parsed))
    }

    /// Version specification parsed from the (possibly unlocked) version
    pub fn version_specification(&self) -> Result<&VersionSpecifiers, PackageError> {
        if let Some(spec) = self.version_spec.get() {
            return Ok(spec);
        }

        let parsed = parse_version_specification(&self.version)?;
        Ok(self.version_spec.get_or_init(|| parsed))
    }

    /// Check whether a candidate release satisfies this package's version specification
    pub fn satisfies(&self, candidate: &str) -> Result<bool, PackageError> {
        specification_contains(self.version_specification()?, candidate)
    }

    /// Turn the locked version into its negation (`==1.2.3` -> `!1.2.3`)
    ///
    /// Used to exclude a specific release when re-resolving.
    pub fn negate_version(&mut self) -> Result<(), PackageError> {
        let Some(locked) = self.version.strip_prefix(LOCKED_PREFIX) else {
            return Err(PackageError::Internal(format!(
                "Negating version on non-locked package {} with version {} is not supported",
                self.name, self.version
            )));
        };

        let negated = format!("{}{}", NEGATED_PREFIX, locked);
        self.set_version(negated);
        Ok(())
    }

    /// Independent copy for branching during resolution
    pub fn duplicate(&self) -> Self {
        Self {
            index: self.index.clone(),
            hashes: self.hashes.clone(),
            markers: self.markers.clone(),
            ..Self::new(self.name.clone(), self.version.clone(), self.develop)
        }
    }

    /// Compare two versions of the same package by semantic version
    pub fn try_cmp(&self, other: &Self) -> Result<Ordering, PackageError> {
        if self.name != other.name {
            return Err(PackageError::Validation(format!(
                "Comparing package versions of different package - {} and {}",
                self.name, other.name
            )));
        }

        Ok(self.semantic_version()?.cmp(other.semantic_version()?))
    }

    pub fn try_lt(&self, other: &Self) -> Result<bool, PackageError> {
        Ok(self.try_cmp(other)? == Ordering::Less)
    }

    pub fn try_gt(&self, other: &Self) -> Result<bool, PackageError> {
        Ok(self.try_cmp(other)? == Ordering::Greater)
    }

    /// Create the entry as stored in Pipfile.lock
    pub fn to_lock_entry(&self) -> Result<IndexMap<String, LockEntry>, PackageError> {
        debug!("Generating Pipfile.lock entry for package {}", self.name);

        if !self.is_locked() {
            return Err(PackageError::Internal(format!(
                "Trying to generate Pipfile.lock with package {} not correctly locked: {}",
                self.name, self.version
            )));
        }

        let entry = LockEntry {
            version: self.version.clone(),
            hashes: self.hashes.clone(),
            markers: self.markers.clone(),
            index: self.index.as_ref().map(|source| source.name.clone()),
            extra: IndexMap::new(),
        };

        Ok(IndexMap::from([(self.name.clone(), entry)]))
    }

    /// Create the entry as stated in Pipfile
    pub fn to_manifest_entry(&self) -> IndexMap<String, ManifestEntry> {
        debug!("Generating Pipfile entry for package {}", self.name);

        let entry = if self.index.is_none() && self.markers.is_none() {
            ManifestEntry::Bare(self.version.clone())
        } else {
            ManifestEntry::Detailed(DetailedManifestEntry {
                version: Some(self.version.clone()),
                index: self.index.as_ref().map(|source| source.name.clone()),
                markers: self.markers.clone(),
                extra: IndexMap::new(),
            })
        };

        IndexMap::from([(self.name.clone(), entry)])
    }

    pub fn to_record(&self) -> PackageVersionRecord {
        PackageVersionRecord {
            name: self.name.clone(),
            version: self.version.clone(),
            develop: self.develop,
            index: self.index.as_deref().cloned(),
            hashes: self.hashes.clone(),
            markers: self.markers.clone(),
        }
    }

    /// Identity of a locked package: name, locked version and index URL
    pub fn to_tuple(&self) -> Result<(&str, &str, Option<&str>), PackageError> {
        Ok((self.name.as_str(), self.locked_version()?, self.index_url()))
    }

    pub fn to_tuple_locked(&self) -> Result<(&str, &str, Option<&str>), PackageError> {
        self.to_tuple()
    }

    fn index_url(&self) -> Option<&str> {
        self.index.as_ref().map(|source| source.url.as_str())
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.index_url() == other.index_url()
    }
}

impl Eq for PackageVersion {}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.version)
    }
}
