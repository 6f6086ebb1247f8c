//! CLI module graph.

pub mod command;
pub mod prune;
pub mod run;
pub mod subscribers;

use crate::error::Result;

use self::command::{Cli, Commands};

/// Run the handler for the parsed command line.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command() {
        Commands::Run => run::execute(&cli.config).await,
        Commands::Subscribers(args) => subscribers::execute(&cli.config, args.all, args.json),
        Commands::Prune(args) => prune::execute(&cli.config, args.days).await,
    }
}
