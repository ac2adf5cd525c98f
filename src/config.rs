//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory (or `--config PATH`)
//! 3. `QUICKDUPE_` environment variables (e.g. `QUICKDUPE_IO_THREADS=8`)
//! 4. Command-line flags, applied by the caller
//!
//! A broken configuration never stops a scan: it is logged and the defaults
//! are used instead.

use anyhow::Result;
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::manifest::DEFAULT_MANIFEST_FILE;
use crate::scanner::ShortReadPolicy;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "QUICKDUPE_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of I/O threads for hashing within a group.
    pub io_threads: usize,
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Extra gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
    /// How to treat a sampled window that reads short.
    pub short_read_policy: ShortReadPolicy,
    /// Where the removal manifest is written and read.
    pub manifest_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 4,
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            short_read_policy: ShortReadPolicy::default(),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_FILE),
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Ok(path) => Some(path),
            Err(e) => {
                log::debug!("No config directory available: {}", e);
                None
            }
        };
        Self::load_or_default(path.as_deref())
    }

    /// Load the configuration from `path` instead of the default location.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            log::warn!("Config file not found: {}, using defaults", path.display());
        }
        Self::load_or_default(Some(path))
    }

    fn load_or_default(path: Option<&Path>) -> Self {
        match Self::figment(path).extract::<Self>() {
            Ok(config) => {
                log::debug!("Loaded configuration: {:?}", config);
                config
            }
            Err(e) => {
                log::warn!("Invalid configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Build the layered provider: defaults, optional TOML file, environment.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default platform-specific configuration path.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "quickdupe", "quickdupe")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
