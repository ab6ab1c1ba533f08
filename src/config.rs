use serde::Deserialize;
use std::path::PathBuf;

// =============================================================================
// Version string constants
// =============================================================================

/// Prefix marking a version locked to an exact release (`==1.2.3`)
pub const LOCKED_PREFIX: &str = "==";

/// Prefix of a negated locked version (`!1.2.3`)
pub const NEGATED_PREFIX: &str = "!";

/// Version specifier accepting any release
pub const ANY_VERSION: &str = "*";

/// Keys of a Pipfile entry pointing at a version control system instead of an index
pub const VCS_KEYS: [&str; 4] = ["git", "hg", "bzr", "svn"];

/// Environment variable holding the tracing filter directive
pub const LOG_ENV_VAR: &str = "PIPENV_PACKAGE_LOG";

/// Default log level used when no filter is configured
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    /// Filter directive (e.g. `info`, `pipenv_package=debug`)
    pub level: String,
    pub format: LogFormat,
    /// Write logs to [`log_path`] instead of stderr
    pub file: bool,
}

impl LogConfig {
    /// Parse a JSON logging configuration, using defaults for missing fields
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::default(),
            file: false,
        }
    }
}

/// Output format of log records
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Returns the path to the data directory for pipenv-package, which holds the
/// log file written when file logging is enabled.
/// Uses $XDG_DATA_HOME/pipenv-package if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/pipenv-package,
/// or ./pipenv-package if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("pipenv-package.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("pipenv-package")
}
