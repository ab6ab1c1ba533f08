use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use pipenv_package::config::{self, LOG_ENV_VAR, LogConfig, LogFormat};
use pipenv_package::package::{LockEntry, ManifestEntry, PackageVersion};
use pipenv_package::source::SourceRegistry;

#[derive(Parser)]
#[command(name = "pipenv-package")]
#[command(version, about = "Inspect package versions locked in Pipfile.lock")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Write logs to the data directory instead of stderr
    #[arg(long, global = true)]
    log_file: bool,

    /// JSON logging configuration file; the flags above override it
    #[arg(long, global = true)]
    log_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List locked packages with their semantic versions
    Inspect {
        lock: PathBuf,
        /// Include development packages
        #[arg(long)]
        dev: bool,
    },
    /// Print Pipfile entries of the locked packages as JSON
    Pipfile {
        lock: PathBuf,
        /// Include development packages
        #[arg(long)]
        dev: bool,
    },
    /// Check whether a candidate release satisfies a locked package
    Check {
        lock: PathBuf,
        name: String,
        candidate: String,
    },
}

/// The parts of Pipfile.lock this tool reads
#[derive(Deserialize)]
struct PipfileLock {
    #[serde(rename = "_meta", default)]
    meta: LockMeta,
    #[serde(default)]
    default: IndexMap<String, LockEntry>,
    #[serde(default)]
    develop: IndexMap<String, LockEntry>,
}

#[derive(Deserialize, Default)]
struct LockMeta {
    #[serde(default)]
    sources: SourceRegistry,
}

impl PipfileLock {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn packages(self, dev: bool) -> anyhow::Result<Vec<PackageVersion>> {
        let sources = self.meta.sources;
        debug!("Pipfile.lock declares {} sources", sources.len());

        let develop = if dev { self.develop } else { IndexMap::new() };
        let sections = [(false, self.default), (true, develop)];

        let mut packages = Vec::new();
        for (is_develop, section) in sections {
            for (name, entry) in section {
                packages.push(PackageVersion::from_lock_entry(
                    &name, entry, is_develop, &sources,
                )?);
            }
        }

        Ok(packages)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = match &cli.log_config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            LogConfig::from_json(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => LogConfig::default(),
    };
    if cli.verbose {
        log_config.level = "debug".to_string();
    }
    if cli.log_json {
        log_config.format = LogFormat::Json;
    }
    if cli.log_file {
        log_config.file = true;
    }
    let _guard = init_logging(&log_config)?;

    match cli.command {
        Command::Inspect { lock, dev } => inspect(&lock, dev),
        Command::Pipfile { lock, dev } => pipfile(&lock, dev),
        Command::Check {
            lock,
            name,
            candidate,
        } => check(&lock, &name, &candidate),
    }
}

fn inspect(lock: &Path, dev: bool) -> anyhow::Result<()> {
    let packages = PipfileLock::load(lock)?.packages(dev)?;
    info!("Loaded {} packages from {}", packages.len(), lock.display());

    for package in &packages {
        println!(
            "{}\t{}\t{}\t{}{}",
            package.name(),
            package.locked_version()?,
            package.semantic_version()?,
            package.index().map_or("-", |source| source.name.as_str()),
            if package.develop() { "\t(dev)" } else { "" }
        );
    }

    Ok(())
}

fn pipfile(lock: &Path, dev: bool) -> anyhow::Result<()> {
    let packages = PipfileLock::load(lock)?.packages(dev)?;

    let mut sections: IndexMap<&str, IndexMap<String, ManifestEntry>> = IndexMap::new();
    sections.insert("packages", IndexMap::new());
    if dev {
        sections.insert("dev-packages", IndexMap::new());
    }

    for package in &packages {
        let section = if package.develop() {
            "dev-packages"
        } else {
            "packages"
        };
        sections
            .entry(section)
            .or_default()
            .extend(package.to_manifest_entry());
    }

    println!("{}", serde_json::to_string_pretty(&sections)?);
    Ok(())
}

fn check(lock: &Path, name: &str, candidate: &str) -> anyhow::Result<()> {
    let packages = PipfileLock::load(lock)?.packages(true)?;
    let package = packages
        .iter()
        .find(|package| package.name() == name)
        .with_context(|| format!("Package {} not found in {}", name, lock.display()))?;

    if package.satisfies(candidate)? {
        println!("{} satisfies {}", candidate, package);
    } else {
        println!("{} does not satisfy {}", candidate, package);
    }

    Ok(())
}

fn init_logging(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if !config.file {
        let builder = builder.with_writer(std::io::stderr);
        match config.format {
            LogFormat::Json => builder.json().init(),
            LogFormat::Text => builder.init(),
        }
        return Ok(None);
    }

    let path = config::log_path();
    let dir = path
        .parent()
        .context("Log path has no parent directory")?;
    let file_name = path
        .file_name()
        .context("Log path has no file name")?;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    let builder = builder.with_ansi(false).with_writer(writer);
    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }

    Ok(Some(guard))
}
