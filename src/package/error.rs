use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageError {
    /// Malformed or incomplete Pipfile / Pipfile.lock entry
    #[error("Parse error: {0}")]
    Parse(String),

    /// Entry relies on a source mechanism other than a package index
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Operation invoked on a package version in the wrong state
    #[error("Internal error: {0}")]
    Internal(String),

    /// Ordering requested between versions of different packages
    #[error("Validation error: {0}")]
    Validation(String),
}
