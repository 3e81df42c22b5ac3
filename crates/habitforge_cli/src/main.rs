//! HabitForge command-line entry point.
//!
//! # Responsibility
//! - Parse arguments and resolve runtime configuration.
//! - Map engine error kinds to process exit codes.

use clap::{Parser, Subcommand};
use habitforge_core::{init_logging_from_config, EngineConfig, EngineError};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "habitforge", version, about = "HabitForge habit tracker")]
struct Cli {
    /// SQLite database file (overrides HABITFORGE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a habit
    Create {
        #[arg(short, long)]
        user: String,
        name: String,
        /// daily, weekly or monthly
        #[arg(short, long)]
        frequency: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Record a completion
    Log {
        #[arg(short, long)]
        user: String,
        name: String,
        #[arg(default_value = "done")]
        value: String,
    },
    /// Current streak
    Streak {
        #[arg(short, long)]
        user: String,
        name: String,
    },
    /// Adherence statistics
    Stats {
        #[arg(short, long)]
        user: String,
        name: String,
    },
    /// Log history, oldest first
    History {
        #[arg(short, long)]
        user: String,
        name: String,
    },
    /// List a user's habits
    List {
        #[arg(short, long)]
        user: String,
    },
    /// Rename a habit
    Rename {
        #[arg(short, long)]
        user: String,
        name: String,
        new_name: String,
    },
    /// Show or replace a habit's status
    Status {
        #[arg(short, long)]
        user: String,
        name: String,
        /// New status; an empty string clears it
        #[arg(long)]
        set: Option<String>,
    },
    /// Delete a habit and its logs
    Delete {
        #[arg(short, long)]
        user: String,
        name: String,
    },
    /// Check core linkage and storage
    Ping,
}

fn main() {
    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("warning: logging disabled: {err}");
    }

    if let Err(err) = commands::run(cli.command, &config) {
        eprintln!("error: {err}");
        std::process::exit(exit_code(err.as_ref()));
    }
}

fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<EngineError>().map(EngineError::kind) {
        Some("validation") => 2,
        Some("not_found") => 3,
        Some("rate_limited") => 4,
        _ => 1,
    }
}
