//! Package versions of an application stack
//!
//! # Modules
//!
//! - [`version`]: the `PackageVersion` entity and its Pipfile / Pipfile.lock conversions
//! - [`entry`]: boundary shapes of Pipfile and Pipfile.lock entries
//! - [`semver`]: semantic version and version specification parsing
//! - [`model`]: persisted resolution results
//! - [`error`]: error type shared by the package layer

pub mod entry;
pub mod error;
pub mod model;
pub mod semver;
pub mod version;

pub use entry::{DetailedManifestEntry, LockEntry, ManifestEntry};
pub use error::PackageError;
pub use model::{PackageVersionModel, PersistedPackage};
pub use version::{PackageVersion, PackageVersionRecord};
