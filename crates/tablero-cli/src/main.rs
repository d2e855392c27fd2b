//! Tablero CLI - kanban boards in a shared store
//!
//! Manage boards, columns and cards, move cards around, transfer them as
//! CSV and watch a board update live.

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::Cli;

/// Initialize tracing with optional file logging.
fn init_tracing(log_file: Option<&std::path::Path>, verbose: bool) -> anyhow::Result<()> {
    let default_filter = if verbose {
        "tablero=debug,tablero_core=debug,tablero_store=debug"
    } else {
        "tablero=info,tablero_core=info,tablero_store=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Diagnostics go to stderr so CSV written to stdout stays clean.
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_file.as_deref(), cli.verbose) {
        eprintln!("{} Could not open log file: {}", "✗".red().bold(), e);
        std::process::exit(1);
    }

    if let Err(e) = cli.execute().await {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("{} {}", "✗".red().bold(), output::error_message(&e));
        std::process::exit(1);
    }
}
