//! Build trigger seam
//!
//! The watcher only decides *when* to build. What a build does belongs to an
//! external build system plugged in through [`BuildTrigger`].

use async_trait::async_trait;
use eyre::Result;
use tracing::info;

/// Action invoked once for every cycle that found new commits
#[async_trait]
pub trait BuildTrigger: Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// Placeholder trigger that records the request and does nothing else
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBuild;

#[async_trait]
impl BuildTrigger for NoopBuild {
    async fn run(&self) -> Result<()> {
        info!("Build requested (no build system attached)");
        Ok(())
    }
}
