//! Trailblazer CLI - train a Q-learning agent on random checkpoint mazes
//!
//! Training runs on a blocking worker thread; Ctrl+C or SIGTERM stops it
//! between episodes and the session is saved before exit.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::unused_async)]
#![allow(clippy::if_not_else)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod render;

use crate::commands::{inspect, play, train};
use crate::config::{Config, LoggingConfig};

#[derive(Parser)]
#[command(name = "trail")]
#[command(author, version, about = "Trailblazer - Q-learning on checkpoint mazes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (overrides TRAIL_CONFIG and the default locations)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the agent, resuming the saved session unless --fresh
    Train(train::TrainArgs),

    /// Watch the agent run rendered episodes in the terminal
    Play(play::PlayArgs),

    /// Summarize the saved snapshots
    Inspect(inspect::InspectArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(commands::config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    let file_logging_enabled = init_tracing(&config.logging, cli.verbose);
    if file_logging_enabled {
        info!("Logging to file: {}", config.logging.file);
    } else if !config.logging.file.is_empty() {
        warn!("File logging was configured but could not be enabled");
    }

    match cli.command {
        Commands::Train(args) => train::run(args, config).await,
        Commands::Play(args) => play::run(args, config).await,
        Commands::Inspect(args) => inspect::run(&args, &config),
        Commands::Config(cmd) => commands::config::run(cmd, &config),
    }
}

/// Install the tracing subscriber. Returns whether file logging is active.
fn init_tracing(logging: &LoggingConfig, verbose: bool) -> bool {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("trail={level},trail_core={level},trail_rl={level}").into());

    if logging.file.is_empty() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
        return false;
    }

    let log_path = std::path::Path::new(&logging.file);
    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("."));
    let log_filename = log_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("trail.log");

    // Create the directory and test write permissions
    let can_write = (|| -> std::io::Result<()> {
        if !log_dir.exists() {
            std::fs::create_dir_all(log_dir)?;
        }
        let test_path = log_dir.join(".write_test");
        std::fs::write(&test_path, "test")?;
        std::fs::remove_file(&test_path)?;
        Ok(())
    })();

    match can_write {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .init();

            // Flushes on drop; must live until exit
            Box::leak(Box::new(guard));
            true
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            eprintln!(
                "Warning: Could not set up file logging to '{}': {}. Using stdout only.",
                logging.file, e
            );
            false
        }
    }
}

/// Wait for shutdown signal (SIGINT, SIGTERM)
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}. Using Ctrl+C only.", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        () = terminate => {
            info!("Received SIGTERM");
        }
    }
}
