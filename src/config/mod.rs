//! Configuration loading and validation.
//!
//! Settings come from an optional `beanpatch.toml` next to the ledger,
//! with CLI arguments layered on top. Every field has a default; the
//! only required piece of information is the ledger entrypoint itself.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::cli::Cli;

/// Default ledger file suffix watched and listed
const DEFAULT_SUFFIX: &str = ".bean";

/// Default watch cooldown in seconds
const DEFAULT_COOLDOWN_SECS: u64 = 2;

/// Default query row cap
const DEFAULT_MAX_ROWS: usize = 200;

/// Resolved configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ledger entrypoint file (absolute once loaded)
    pub ledger: PathBuf,

    /// File suffix that identifies ledger files (watch filter, `files` listing)
    pub suffix: String,

    pub watch: WatchSection,
    pub query: QuerySection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Minimum seconds between accepted reload-triggering notifications
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuerySection {
    /// Maximum number of rows a query returns
    pub max_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger: PathBuf::new(),
            suffix: DEFAULT_SUFFIX.to_string(),
            watch: WatchSection::default(),
            query: QuerySection::default(),
        }
    }
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
        }
    }
}

impl Default for QuerySection {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl Config {
    /// Load configuration: `beanpatch.toml` if present, CLI overrides
    /// on top, then validation.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = if cli.config.exists() {
            let content = std::fs::read_to_string(&cli.config)
                .with_context(|| format!("cannot read config `{}`", cli.config.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("cannot parse config `{}`", cli.config.display()))?
        } else {
            Self::default()
        };

        if let Some(ledger) = &cli.ledger {
            config.ledger = ledger.clone();
        }

        config.validate()?;
        config.ledger = normalize_path(&config.ledger);
        Ok(config)
    }

    /// Minimal config for one ledger file, defaults everywhere else.
    pub fn for_ledger(ledger: &Path) -> Self {
        Self {
            ledger: normalize_path(ledger),
            ..Self::default()
        }
    }

    /// Directory tree the ledger lives in (watch root, `files` root).
    pub fn root(&self) -> PathBuf {
        self.ledger
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    /// Whether a path carries the configured ledger suffix.
    pub fn matches_suffix(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(&self.suffix))
    }

    fn validate(&self) -> Result<()> {
        if self.ledger.as_os_str().is_empty() {
            bail!("no ledger file given: pass one as `--ledger` or set `ledger` in beanpatch.toml");
        }
        if !self.ledger.is_file() {
            bail!("ledger file `{}` does not exist", self.ledger.display());
        }
        if !self.suffix.starts_with('.') {
            bail!("suffix `{}` must start with a dot", self.suffix);
        }
        if self.watch.cooldown_secs == 0 {
            bail!("watch.cooldown_secs must be at least 1");
        }
        Ok(())
    }
}

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`); falls
/// back to joining with the current directory.
fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}
