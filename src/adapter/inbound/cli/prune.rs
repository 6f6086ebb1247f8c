//! Handler for the `prune` command.

use std::path::Path;

use crate::application::retention::prune_once;
use crate::error::Result;
use crate::infrastructure::bootstrap::open_ledger;
use crate::infrastructure::config::settings::Config;

/// Run one retention sweep and report how many records were removed.
pub async fn execute(config_path: &Path, days: Option<u32>) -> Result<()> {
    let config = Config::load(config_path)?;
    let mut policy = config.retention.policy();
    if let Some(days) = days {
        policy.keep_days = days;
    }

    let ledger = open_ledger(&config)?;
    let removed = prune_once(&*ledger, policy).await?;
    println!(
        "Removed {removed} notification record(s) older than {} days",
        policy.keep_days
    );
    Ok(())
}
