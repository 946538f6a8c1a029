//! Repository probes
//!
//! A probe answers one question per tick: did the tracked branch gain
//! commits? [`GitProbe`] answers it by pulling with the git CLI; tests plug
//! in scripted probes through the [`RepositoryProbe`] trait.

mod classify;
mod error;
mod git;

use async_trait::async_trait;

pub use classify::{UP_TO_DATE_MARKER, classify_pull_output};
pub use error::CheckError;
pub use git::{GitProbe, PullOutput};

/// Outcome of one check: `Ok(true)` means new commits arrived
pub type UpdateResult = Result<bool, CheckError>;

/// Capability to check a repository for new commits
#[async_trait]
pub trait RepositoryProbe: Send {
    /// Check once, bringing the local checkout up to date as a side effect
    async fn check(&mut self) -> UpdateResult;
}
