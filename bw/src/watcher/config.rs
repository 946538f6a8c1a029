//! Watcher configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between repository checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How a pull is turned into "updates found" / "up to date"
///
/// `revision` is the default. `pull-output` matches git's human-readable
/// message, which misreads conflicts, reworded or translated output; choose
/// it only for parity with older build servers that parsed the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMode {
    /// Compare `HEAD` before and after the pull
    #[default]
    Revision,

    /// Look for "Already up to date" in the pull output (legacy behaviour)
    PullOutput,
}

/// Configuration for the repository watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WatcherConfig {
    /// Checkout to pull into
    #[serde(default = "default_repo_path")]
    pub repo_path: PathBuf,

    /// The remote name
    #[serde(default = "default_remote")]
    pub remote: String,

    /// The branch to pull
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Polling interval in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Change detection strategy
    #[serde(default)]
    pub detection: DetectionMode,

    /// Abandon a pull that runs longer than this; unset means wait forever
    #[serde(default)]
    pub pull_timeout_secs: Option<u64>,
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            repo_path: default_repo_path(),
            remote: default_remote(),
            branch: default_branch(),
            poll_interval_secs: default_poll_interval_secs(),
            detection: DetectionMode::default(),
            pull_timeout_secs: None,
        }
    }
}

impl WatcherConfig {
    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get the pull timeout as a Duration, if one is configured
    pub fn pull_timeout(&self) -> Option<Duration> {
        self.pull_timeout_secs.map(Duration::from_secs)
    }

    /// Get the full remote branch reference
    pub fn remote_branch(&self) -> String {
        format!("{}/{}", self.remote, self.branch)
    }
}
