//! Termination signal handling
//!
//! Turns SIGINT / SIGTERM (Ctrl+C elsewhere) into an orderly stop of the
//! scheduler. There is no separate hard-kill path.

use std::fmt;

use eyre::{Context, Result};
use tracing::{debug, info, warn};

use crate::watcher::{SchedulerHandle, SchedulerReport};

/// Line printed to stdout once the scheduler has stopped
pub const SHUTDOWN_NOTICE: &str = "Stopping build watcher";

/// A request from the OS to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationRequest {
    Interrupt,
    Terminate,
}

impl fmt::Display for TerminationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationRequest::Interrupt => f.write_str("SIGINT"),
            TerminationRequest::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Signal subscriptions, registered before the scheduler starts
pub struct ShutdownHandler {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
}

impl ShutdownHandler {
    /// Subscribe to interrupt and termination signals
    #[cfg(unix)]
    pub fn install() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        debug!("ShutdownHandler::install: called");
        let sigint = signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;
        let sigterm = signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
        Ok(Self { sigint, sigterm })
    }

    /// Subscribe to Ctrl+C
    #[cfg(not(unix))]
    pub fn install() -> Result<Self> {
        debug!("ShutdownHandler::install: called");
        Ok(Self {})
    }

    /// Wait for the first termination request
    #[cfg(unix)]
    pub async fn wait(&mut self) -> Result<TerminationRequest> {
        debug!("ShutdownHandler::wait: called");
        let request = tokio::select! {
            _ = self.sigint.recv() => TerminationRequest::Interrupt,
            _ = self.sigterm.recv() => TerminationRequest::Terminate,
        };
        Ok(request)
    }

    /// Wait for Ctrl+C
    #[cfg(not(unix))]
    pub async fn wait(&mut self) -> Result<TerminationRequest> {
        debug!("ShutdownHandler::wait: called");
        tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;
        Ok(TerminationRequest::Interrupt)
    }

    /// Block until a termination request, then stop the scheduler
    ///
    /// Returns once the scheduler's timer is confirmed stopped and the
    /// shutdown notice has been printed.
    pub async fn run(mut self, handle: SchedulerHandle) -> Result<SchedulerReport> {
        info!("Watcher running. Press Ctrl+C to stop.");

        let request = self.wait().await?;
        warn!(%request, "Termination requested");

        let report = handle.stop().await.context("Failed to stop scheduler")?;

        println!("{}", SHUTDOWN_NOTICE);
        info!(
            ticks = report.ticks,
            builds = report.builds,
            build_failures = report.build_failures,
            check_failures = report.check_failures,
            "Shutdown complete"
        );
        Ok(report)
    }
}
