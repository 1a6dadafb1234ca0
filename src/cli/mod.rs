//! Operator commands.
//!
//! A thin shell over [`ProfileEngine`]: every command opens the configured
//! database, makes sure the schema is current, and prints JSON to stdout.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::db::{self, Database};
use crate::profile::ProfileEngine;

#[derive(Parser, Debug)]
#[command(
    name = "dreamer-profile",
    version,
    about = "Compute and inspect dreamer profiles"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create or upgrade the database schema
    Migrate,

    /// Recalculate a user's profile and print the stored snapshot
    Recalculate {
        /// User to recalculate
        #[arg(long)]
        user: String,

        /// Evaluate as of this RFC 3339 instant instead of now
        #[arg(long, value_parser = parse_timestamp)]
        now: Option<DateTime<Utc>>,
    },

    /// Print the user's profile, recalculating when stale or missing
    Show {
        #[arg(long)]
        user: String,
    },

    /// Print the user's unlock progress
    Progress {
        #[arg(long)]
        user: String,
    },

    /// Flag the user's profile for recalculation on next read
    MarkStale {
        #[arg(long)]
        user: String,
    },
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

/// Run one command against the configured database.
pub async fn run_command(command: Command, config: &Config) -> anyhow::Result<()> {
    let db = open_database(config).await?;

    let engine = ProfileEngine::new(db).with_timeout(config.profile.recalc_timeout);
    match command {
        Command::Migrate => {
            println!("Schema is up to date ({} backend)", config.database.backend);
        }
        Command::Recalculate { user, now } => {
            let profile = match now {
                Some(now) => engine.recalculate_at(&user, now).await?,
                None => engine.recalculate(&user).await?,
            };
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Command::Show { user } => {
            let view = engine.view(&user).await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::Progress { user } => {
            let progress = engine.unlock_progress(&user).await?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        Command::MarkStale { user } => {
            if engine.mark_stale(&user).await? {
                println!("Marked profile for {user} as stale");
            } else {
                println!("No profile stored for {user}");
            }
        }
    }
    Ok(())
}

async fn open_database(config: &Config) -> anyhow::Result<Arc<dyn Database>> {
    let db = db::connect_from_config(&config.database).await?;
    db.run_migrations().await?;
    Ok(db)
}
