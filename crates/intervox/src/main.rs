// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intervox - voice-call agent orchestrator.
//!
//! This is the binary entry point: it loads configuration and dispatches
//! to the subcommands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod accounts;
mod replay;
#[cfg(feature = "gateway")]
mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use intervox_config::model::IntervoxConfig;

/// Intervox - voice-call agent orchestrator.
#[derive(Parser, Debug)]
#[command(name = "intervox", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the orchestrator with its HTTP gateway.
    #[cfg(feature = "gateway")]
    Serve,
    /// Show provider pool health from a running gateway.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// List configured provider accounts (tokens are never printed).
    Accounts,
    /// Reconcile a saved call transcript.
    Replay {
        /// JSON file holding the session type, user id, and transcript.
        file: PathBuf,
        /// Submit to the interview API instead of printing the match.
        #[arg(long)]
        submit: bool,
    },
    /// Create the default interview for a user.
    GenerateDefault {
        #[arg(long)]
        user_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => intervox_config::load_and_validate_path(path),
        None => intervox_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            intervox_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(
    command: Option<Commands>,
    config: IntervoxConfig,
) -> Result<(), intervox_core::IntervoxError> {
    match command {
        #[cfg(feature = "gateway")]
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        Some(Commands::Accounts) => {
            accounts::run_accounts(&config);
            Ok(())
        }
        Some(Commands::Replay { file, submit }) => replay::run_replay(&config, &file, submit).await,
        Some(Commands::GenerateDefault { user_id }) => {
            replay::run_generate_default(&config, &user_id).await
        }
        None => {
            println!("intervox: use --help for available commands");
            Ok(())
        }
    }
}

/// Installs the global tracing subscriber.
pub(crate) fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("intervox={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
