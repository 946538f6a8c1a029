//! buildwatch configuration types and loading

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::watcher::WatcherConfig;

/// Main buildwatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub log_level: Option<String>,

    /// Write logs here instead of stdout
    pub log_file: Option<PathBuf>,

    /// Repository watcher settings
    pub watcher: WatcherConfig,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.watcher.poll_interval_secs == 0 {
            return Err(eyre!("watcher.poll-interval-secs must be greater than zero"));
        }
        if self.watcher.remote.trim().is_empty() {
            return Err(eyre!("watcher.remote must not be empty"));
        }
        if self.watcher.branch.trim().is_empty() {
            return Err(eyre!("watcher.branch must not be empty"));
        }
        if self.watcher.pull_timeout_secs == Some(0) {
            return Err(eyre!("watcher.pull-timeout-secs must be greater than zero when set"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local .buildwatch.yml, then ~/.config/buildwatch/buildwatch.yml
        let mut candidates = vec![PathBuf::from(".buildwatch.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("buildwatch").join("buildwatch.yml"));
        }
        Self::load_first_existing(&candidates)
    }

    /// Load the first candidate that exists; a file that exists but fails
    /// to load is an error, not a reason to fall through
    fn load_first_existing(candidates: &[PathBuf]) -> Result<Self> {
        match candidates.iter().find(|path| path.exists()) {
            Some(path) => {
                Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()))
            }
            None => {
                tracing::info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
