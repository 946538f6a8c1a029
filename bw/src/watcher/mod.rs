//! Watcher module for polling a git branch and triggering builds
//!
//! The [`Scheduler`] ticks at a fixed interval, asks a
//! [`RepositoryProbe`](crate::probe::RepositoryProbe) whether the branch
//! moved, and fires the [`BuildTrigger`](crate::build::BuildTrigger) when it
//! did. [`SchedulerHandle`] owns the running task and its stop channel.

mod config;
mod handle;
mod scheduler;

pub use config::{DEFAULT_POLL_INTERVAL, DetectionMode, WatcherConfig};
pub use handle::SchedulerHandle;
pub use scheduler::{CycleOutcome, LoopState, Scheduler, SchedulerReport};
