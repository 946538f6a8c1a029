//! Repository probe backed by the git CLI

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::classify::classify_pull_output;
use super::error::CheckError;
use super::{RepositoryProbe, UpdateResult};
use crate::watcher::{DetectionMode, WatcherConfig};

/// Captured result of one `git pull`
#[derive(Debug, Clone)]
pub struct PullOutput {
    /// Exit code, `None` when git was killed by a signal
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for PullOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

impl PullOutput {
    /// Fail unless git exited cleanly
    pub fn ensure_success(&self) -> Result<(), CheckError> {
        if self.success {
            return Ok(());
        }
        debug!(code = ?self.code, "PullOutput::ensure_success: pull failed");
        Err(CheckError::PullFailed {
            code: self.code,
            stderr: self.stderr.clone(),
        })
    }

    /// Classify by the "Already up to date" marker in stdout
    pub fn classify(&self) -> UpdateResult {
        self.ensure_success()?;
        Ok(classify_pull_output(&self.stdout))
    }
}

/// Pulls the tracked branch with `git pull <remote> <branch>`
pub struct GitProbe {
    repo_path: PathBuf,
    remote: String,
    branch: String,
    detection: DetectionMode,
    pull_timeout: Option<Duration>,
    last_known_sha: Option<String>,
}

impl GitProbe {
    /// Create a new GitProbe
    pub fn new(config: &WatcherConfig) -> Self {
        debug!(?config, "GitProbe::new: called");
        Self {
            repo_path: config.repo_path.clone(),
            remote: config.remote.clone(),
            branch: config.branch.clone(),
            detection: config.detection,
            pull_timeout: config.pull_timeout(),
            last_known_sha: None,
        }
    }

    /// HEAD as of the last revision-mode check
    pub fn last_known_sha(&self) -> Option<&str> {
        self.last_known_sha.as_deref()
    }

    /// Run `git pull` and capture its output
    ///
    /// git runs in its own process group so a timeout can take down the
    /// transport (ssh or `core.sshCommand`) along with it.
    async fn pull(&self) -> Result<PullOutput, CheckError> {
        debug!(remote = %self.remote, branch = %self.branch, "GitProbe::pull: called");

        let mut command = Command::new("git");
        command
            .arg("pull")
            .arg(&self.remote)
            .arg(&self.branch)
            .current_dir(&self.repo_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let spawn_error = |source| CheckError::Spawn {
            command: "pull".to_string(),
            source,
        };
        let child = command.spawn().map_err(spawn_error)?;
        let pid = child.id();
        let pull = child.wait_with_output();

        let output = match self.pull_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, pull).await {
                Ok(output) => output,
                Err(_) => {
                    debug!(?timeout, ?pid, "GitProbe::pull: timed out");
                    kill_process_group(pid);
                    return Err(CheckError::TimedOut {
                        timeout_secs: timeout.as_secs(),
                    });
                }
            },
            None => pull.await,
        }
        .map_err(spawn_error)?;

        let output = PullOutput::from(output);
        debug!(code = ?output.code, stdout_len = output.stdout.len(), "GitProbe::pull: completed");
        Ok(output)
    }

    /// Resolve HEAD, `None` when the branch has no commits yet
    async fn head_sha(&self) -> Result<Option<String>, CheckError> {
        debug!("GitProbe::head_sha: called");
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", "HEAD"])
            .current_dir(&self.repo_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| CheckError::Spawn {
                command: "rev-parse".to_string(),
                source,
            })?;

        if output.status.success() {
            let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
            return Ok(Some(sha));
        }

        // --verify --quiet exits 1 without output for an unborn HEAD
        if output.status.code() == Some(1) && output.stderr.is_empty() {
            debug!("GitProbe::head_sha: HEAD is unborn");
            return Ok(None);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(CheckError::Revision(stderr.trim().to_string()))
    }

    async fn check_revision(&mut self) -> UpdateResult {
        let before = self.head_sha().await?;
        self.pull().await?.ensure_success()?;
        let after = self.head_sha().await?;

        let updated = before != after;
        if updated {
            info!(
                old_sha = before.as_deref().unwrap_or("(none)"),
                new_sha = after.as_deref().unwrap_or("(none)"),
                "Branch updated"
            );
        } else {
            debug!(sha = ?after, "GitProbe::check_revision: branch unchanged");
        }

        self.last_known_sha = after;
        Ok(updated)
    }
}

/// SIGKILL every process in the group led by `pid`
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        // ESRCH: the whole group already exited
        debug!(pid, error = %e, "kill_process_group: killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[async_trait]
impl RepositoryProbe for GitProbe {
    async fn check(&mut self) -> UpdateResult {
        debug!(detection = ?self.detection, "GitProbe::check: called");
        match self.detection {
            DetectionMode::PullOutput => self.pull().await?.classify(),
            DetectionMode::Revision => self.check_revision().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pull_output(success: bool, code: i32, stdout: &str, stderr: &str) -> PullOutput {
        PullOutput {
            code: Some(code),
            success,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_classify_up_to_date() {
        let out = pull_output(true, 0, "Already up to date.", "");
        assert!(!out.classify().unwrap());
    }

    #[test]
    fn test_classify_fast_forward() {
        let out = pull_output(true, 0, "Updating a1b2c3..d4e5f6\nFast-forward\n", "");
        assert!(out.classify().unwrap());
    }

    #[test]
    fn test_classify_failed_pull_is_error() {
        let out = pull_output(
            false,
            1,
            "fatal: unable to access 'origin': Could not resolve host",
            "",
        );
        match out.classify() {
            Err(CheckError::PullFailed { code, .. }) => assert_eq!(code, Some(1)),
            other => panic!("Expected PullFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_pull_with_marker_is_still_error() {
        let out = pull_output(false, 1, "Already up to date.", "error: cannot lock ref");
        assert!(out.classify().is_err());
    }

    #[test]
    fn test_classify_is_repeatable() {
        let out = pull_output(true, 0, "Updating a1b2c3..d4e5f6\nFast-forward\n", "");
        assert_eq!(out.classify().unwrap(), out.classify().unwrap());
    }

    #[tokio::test]
    async fn test_missing_repo_dir_is_spawn_error() {
        let config = WatcherConfig {
            repo_path: PathBuf::from("/nonexistent/buildwatch/repo"),
            detection: DetectionMode::PullOutput,
            ..Default::default()
        };
        let mut probe = GitProbe::new(&config);

        match probe.check().await {
            Err(CheckError::Spawn { command, .. }) => assert_eq!(command, "pull"),
            other => panic!("Expected Spawn error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_revision_mode_outside_repo_is_error() {
        let temp = tempfile::tempdir().unwrap();
        let config = WatcherConfig {
            repo_path: temp.path().to_path_buf(),
            ..Default::default()
        };
        let mut probe = GitProbe::new(&config);

        let result = probe.check().await;
        assert!(result.is_err(), "Expected error outside a repository, got {:?}", result);
        assert!(probe.last_known_sha().is_none());
    }
}
