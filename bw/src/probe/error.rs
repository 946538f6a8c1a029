//! Check error types

use thiserror::Error;

/// Errors that abandon a check cycle
///
/// Any of these means "has updates" is unknown and no build may be triggered.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Failed to run git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git pull exited with {}: {}", exit_code_label(*code), stderr.trim())]
    PullFailed { code: Option<i32>, stderr: String },

    #[error("git pull timed out after {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },

    #[error("Failed to resolve HEAD: {0}")]
    Revision(String),
}

fn exit_code_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (killed by signal)".to_string(),
    }
}
