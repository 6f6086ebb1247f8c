//! Command-line interface definitions.
//!
//! Defines the CLI structure for epaywatch using `clap`. Without a
//! subcommand the service runs in the foreground.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Epay merchant watcher with Telegram notifications
#[derive(Parser, Debug)]
#[command(name = "epaywatch")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Poll every active subscriber until Ctrl-C (default)
    Run,

    /// List subscribers and their last poll time
    Subscribers(SubscribersArgs),

    /// Delete notification records older than the retention window
    Prune(PruneArgs),
}

#[derive(Parser, Debug, PartialEq, Eq)]
pub struct SubscribersArgs {
    /// Include subscribers with notifications switched off
    #[arg(long)]
    pub all: bool,
    /// JSON output for scripting
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, PartialEq, Eq)]
pub struct PruneArgs {
    /// Retention period in days; defaults to `retention.keep_days`
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub days: Option<u32>,
}

impl Cli {
    /// The selected subcommand, `run` when none was given.
    #[must_use]
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Run)
    }
}
