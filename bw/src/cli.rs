//! CLI argument parsing for buildwatch

use clap::Parser;
use std::path::PathBuf;

/// buildwatch - pull a git branch on an interval and build when it moves
#[derive(Parser, Debug)]
#[command(
    name = "bw",
    about = "Watch a git remote and trigger a build when new commits land",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)")]
    pub log_level: Option<String>,
}
