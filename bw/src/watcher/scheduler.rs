//! Tick-driven check-and-build loop

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use eyre::{Result, eyre};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::build::BuildTrigger;
use crate::probe::RepositoryProbe;

/// Lifecycle of the watcher loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Starting => "starting",
            LoopState::Running => "running",
            LoopState::Stopping => "stopping",
            LoopState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What one check-and-build cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No new commits
    UpToDate,
    /// New commits, build trigger succeeded
    Built,
    /// New commits, build trigger returned an error
    BuildFailed(String),
    /// The check itself failed; no build was attempted
    CheckFailed(String),
}

/// Counters accumulated over the scheduler's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    pub ticks: u64,
    pub up_to_date: u64,
    pub builds: u64,
    pub build_failures: u64,
    pub check_failures: u64,
}

/// Drives the poll-detect-trigger loop
///
/// Owns the loop state; nothing else writes it. Other tasks observe it through
/// [`Scheduler::subscribe_state`].
pub struct Scheduler {
    poll_interval: Duration,
    probe: Box<dyn RepositoryProbe>,
    build: Arc<dyn BuildTrigger>,
    state_tx: watch::Sender<LoopState>,
    report: SchedulerReport,
}

impl Scheduler {
    /// Create a new Scheduler; a zero `poll_interval` is rejected
    pub fn new(
        poll_interval: Duration,
        probe: Box<dyn RepositoryProbe>,
        build: Arc<dyn BuildTrigger>,
    ) -> Result<Self> {
        debug!(?poll_interval, "Scheduler::new: called");
        if poll_interval.is_zero() {
            return Err(eyre!("poll interval must be non-zero"));
        }
        let (state_tx, _) = watch::channel(LoopState::Starting);
        Ok(Self {
            poll_interval,
            probe,
            build,
            state_tx,
            report: SchedulerReport::default(),
        })
    }

    /// Current loop state
    pub fn state(&self) -> LoopState {
        *self.state_tx.borrow()
    }

    /// Watch loop state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<LoopState> {
        self.state_tx.subscribe()
    }

    /// Counters so far
    pub fn report(&self) -> &SchedulerReport {
        &self.report
    }

    fn transition(&self, next: LoopState) {
        let prev = self.state_tx.send_replace(next);
        debug!(%prev, %next, "Scheduler::transition");
    }

    /// Run exactly one check and, if it found commits, one build
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        debug!("Scheduler::run_cycle: called");
        match self.probe.check().await {
            Err(e) => {
                error!(error = %e, "Failed to check for updates");
                self.report.check_failures += 1;
                CycleOutcome::CheckFailed(e.to_string())
            }
            Ok(false) => {
                debug!("Scheduler::run_cycle: up to date");
                self.report.up_to_date += 1;
                CycleOutcome::UpToDate
            }
            Ok(true) => {
                info!("Updates found, triggering build");
                self.report.builds += 1;
                match self.build.run().await {
                    Ok(()) => CycleOutcome::Built,
                    Err(e) => {
                        error!(error = %e, "Build trigger failed");
                        self.report.build_failures += 1;
                        CycleOutcome::BuildFailed(e.to_string())
                    }
                }
            }
        }
    }

    /// Run the loop until a stop request arrives or the sender is dropped
    ///
    /// The first check happens one interval after start. A cycle that outlasts
    /// the interval delays the next tick rather than queueing extra ones.
    pub async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>) -> SchedulerReport {
        let mut interval = tokio::time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.transition(LoopState::Running);
        info!(interval = ?self.poll_interval, "Scheduler started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }

                _ = interval.tick() => {
                    self.report.ticks += 1;
                    let outcome = self.run_cycle().await;
                    debug!(tick = self.report.ticks, ?outcome, "Scheduler::run: cycle complete");
                }
            }
        }

        self.transition(LoopState::Stopping);
        drop(interval);
        self.transition(LoopState::Stopped);

        info!(
            ticks = self.report.ticks,
            builds = self.report.builds,
            check_failures = self.report.check_failures,
            "Scheduler stopped"
        );
        self.report
    }
}
