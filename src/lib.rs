//! Package version entries as found in `Pipfile` and `Pipfile.lock`
//!
//! - [`config`]: shared constants and logging configuration
//! - [`source`]: package source indexes and the registry resolving them by name
//! - [`package`]: the `PackageVersion` entity and its manifest/lock conversions

pub mod config;
pub mod package;
pub mod source;
