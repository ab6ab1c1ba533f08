//! Persisted resolution results a package version can be rebuilt from

use serde::{Deserialize, Serialize};

/// A package version as stored by a resolution result store
pub trait PersistedPackage {
    fn package_name(&self) -> &str;

    /// Version as persisted, e.g. `==1.2.3`
    fn package_version(&self) -> &str;

    /// URL of the index the package was resolved from
    fn index_url(&self) -> &str;
}

/// Plain record form of [`PersistedPackage`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersionModel {
    pub package_name: String,
    pub package_version: String,
    #[serde(rename = "index")]
    pub index_url: String,
}

impl PersistedPackage for PackageVersionModel {
    fn package_name(&self) -> &str {
        &self.package_name
    }

    fn package_version(&self) -> &str {
        &self.package_version
    }

    fn index_url(&self) -> &str {
        &self.index_url
    }
}
