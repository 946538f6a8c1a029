//! buildwatch - git branch watcher
//!
//! CLI entry point: load config, start the scheduler, wait for a termination
//! signal.

use std::fs;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use buildwatch::cli::Cli;
use buildwatch::config::Config;
use buildwatch::probe::GitProbe;
use buildwatch::shutdown::ShutdownHandler;
use buildwatch::watcher::{Scheduler, SchedulerHandle};
use buildwatch::{NoopBuild, VERSION};

fn parse_level(s: &str) -> tracing::Level {
    match s.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
            tracing::Level::INFO
        }
    }
}

fn setup_logging(cli_log_level: Option<&str>, config: &Config) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let level = cli_log_level
        .or(config.log_level.as_deref())
        .map(parse_level)
        .unwrap_or(tracing::Level::INFO);

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let log_file = fs::File::create(path).context("Failed to create log file")?;
            tracing_subscriber::fmt()
                .with_writer(log_file)
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), &config).context("Failed to setup logging")?;
    config.validate().context("Invalid configuration")?;

    info!(
        version = VERSION,
        repo = %config.watcher.repo_path.display(),
        branch = %config.watcher.remote_branch(),
        detection = ?config.watcher.detection,
        "buildwatch starting"
    );

    // Subscribe to signals before the first tick can fire
    let shutdown = ShutdownHandler::install()?;

    let probe = GitProbe::new(&config.watcher);
    let scheduler = Scheduler::new(config.watcher.poll_interval(), Box::new(probe), Arc::new(NoopBuild))?;
    let handle = SchedulerHandle::start(scheduler);

    shutdown.run(handle).await?;
    Ok(())
}
