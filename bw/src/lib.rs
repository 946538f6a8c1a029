//! buildwatch - poll a git branch and trigger builds
//!
//! A long-running watcher that pulls the tracked branch every few seconds
//! and, when new commits arrive, hands off to a build trigger. It runs until
//! SIGINT or SIGTERM, then stops its timer and exits cleanly.
//!
//! # Control flow
//!
//! ```text
//! tick ──▶ RepositoryProbe::check ──Ok(true)──▶ BuildTrigger::run
//!                 │
//!                 ├─Ok(false)──▶ wait for next tick
//!                 └─Err(_)─────▶ log, wait for next tick
//!
//! SIGINT/SIGTERM ──▶ ShutdownHandler ──▶ SchedulerHandle::stop
//! ```
//!
//! # Modules
//!
//! - [`watcher`] - Scheduler loop, its handle and configuration
//! - [`probe`] - Repository probes and pull-output classification
//! - [`build`] - Build trigger seam
//! - [`shutdown`] - Signal handling
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod build;
pub mod cli;
pub mod config;
pub mod probe;
pub mod shutdown;
pub mod watcher;

/// Version from git describe (set at compile time)
pub const VERSION: &str = env!("GIT_DESCRIBE");

// Re-export commonly used types
pub use build::{BuildTrigger, NoopBuild};
pub use config::Config;
pub use probe::{CheckError, GitProbe, RepositoryProbe, UpdateResult, classify_pull_output};
pub use shutdown::{SHUTDOWN_NOTICE, ShutdownHandler, TerminationRequest};
pub use watcher::{
    CycleOutcome, DEFAULT_POLL_INTERVAL, DetectionMode, LoopState, Scheduler, SchedulerHandle, SchedulerReport,
    WatcherConfig,
};
