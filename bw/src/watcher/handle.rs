//! SchedulerHandle - start/stop interface for a running scheduler

use eyre::{Result, eyre};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use super::scheduler::{LoopState, Scheduler, SchedulerReport};

/// Handle to a scheduler running on its own task
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    state_rx: watch::Receiver<LoopState>,
    task: JoinHandle<SchedulerReport>,
}

impl SchedulerHandle {
    /// Spawn the scheduler loop on the tokio runtime
    pub fn start(scheduler: Scheduler) -> Self {
        debug!("SchedulerHandle::start: called");
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let state_rx = scheduler.subscribe_state();
        let task = tokio::spawn(scheduler.run(shutdown_rx));
        Self {
            shutdown_tx,
            state_rx,
            task,
        }
    }

    /// Current loop state
    pub fn state(&self) -> LoopState {
        *self.state_rx.borrow()
    }

    /// Wait until the loop has entered `Running`
    pub async fn running(&mut self) -> Result<()> {
        self.state_rx
            .wait_for(|state| *state != LoopState::Starting)
            .await
            .map_err(|_| eyre!("Scheduler exited before starting"))?;
        Ok(())
    }

    /// Ask the loop to stop and wait until its timer is gone
    ///
    /// An in-flight cycle finishes first; ticks that have not fired are dropped.
    pub async fn stop(self) -> Result<SchedulerReport> {
        debug!(state = %self.state(), "SchedulerHandle::stop: called");
        if self.shutdown_tx.send(()).await.is_err() {
            debug!("SchedulerHandle::stop: loop already exited");
        }

        let report = self
            .task
            .await
            .map_err(|e| eyre!("Scheduler task failed: {}", e))?;

        debug!(?report, "SchedulerHandle::stop: stopped");
        Ok(report)
    }
}
