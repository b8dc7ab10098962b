//! Stored session commands

use anyhow::{bail, Result};
use clap::Subcommand;

use crate::config::Config;
use crate::store::{JsonFileStore, SessionStore};

#[derive(Subcommand)]
pub enum SessionsCommands {
    /// List stored sessions
    List,
    /// Print a stored session as JSON
    Show {
        /// Session ID
        id: String,
    },
}

pub async fn run(cmd: SessionsCommands, config: Config) -> Result<()> {
    let store = JsonFileStore::new(&config.session.path);
    match cmd {
        SessionsCommands::List => list(&store),
        SessionsCommands::Show { id } => show(&store, &id),
    }
}

fn list(store: &JsonFileStore) -> Result<()> {
    let sessions = store.all()?;
    if sessions.is_empty() {
        println!("No sessions stored in {}", store.path().display());
        return Ok(());
    }

    println!(
        "{:<28} {:<20} {:<9} {:<14} {:<8} {:<8}",
        "SESSION", "STARTED", "VARIANT", "SECRET", "GUESSED", "ATTEMPTS"
    );
    println!("{}", "-".repeat(92));
    for session in sessions {
        let guessed = match session.result.guessed {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };
        let attempts = session
            .result
            .attempts
            .map_or_else(|| "-".to_string(), |a| a.to_string());
        println!(
            "{:<28} {:<20} {:<9} {:<14} {:<8} {:<8}",
            session.session_id,
            session.started_at.format("%Y-%m-%d %H:%M:%S"),
            session.config.variant,
            format!("{:?}", session.config.secret),
            guessed,
            attempts
        );
    }
    Ok(())
}

fn show(store: &JsonFileStore, id: &str) -> Result<()> {
    match store.get(id)? {
        Some(session) => {
            println!("{}", serde_json::to_string_pretty(&session)?);
            Ok(())
        }
        None => bail!("Session not found: {id}"),
    }
}
