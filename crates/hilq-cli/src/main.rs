//! HILQ CLI - Human-in-the-loop Q-learning on Mastermind
//!
//! An agent guesses a secret combination of pegs and learns only from the
//! ratings a human gives each complete attempt.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod store;

use commands::{play, sessions, simulate, states};
use crate::config::Config;

#[derive(Parser)]
#[command(name = "hilq")]
#[command(author, version, about = "HILQ - human-in-the-loop Q-learning on Mastermind", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file, instead of the standard locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a session, rating every attempt from stdin
    Play(play::PlayArgs),

    /// Run a session against a scripted rater
    Simulate(simulate::SimulateArgs),

    /// Inspect the state space
    States(states::StatesArgs),

    /// Stored sessions
    #[command(subcommand)]
    Sessions(sessions::SessionsCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(commands::config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from hilq.env file (before parsing args)
    hilq_core::util::load_env_file();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging based on verbosity
    let log_level = if cli.verbose {
        "debug"
    } else {
        config.log.level.as_str()
    };
    let json = config.log.json;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hilq={log_level}").into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    match cli.command {
        Commands::Play(args) => play::run(args, config).await,
        Commands::Simulate(args) => simulate::run(args, config).await,
        Commands::States(args) => states::run(args, config).await,
        Commands::Sessions(cmd) => sessions::run(cmd, config).await,
        Commands::Config(cmd) => commands::config::run(cmd, config).await,
    }
}
