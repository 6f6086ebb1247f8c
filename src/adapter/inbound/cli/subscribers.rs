//! Handler for the `subscribers` command.

use std::path::Path;

use serde_json::json;

use crate::domain::subscriber::Subscriber;
use crate::error::Result;
use crate::infrastructure::bootstrap::open_ledger;
use crate::infrastructure::config::settings::Config;

/// Print subscribers from the ledger.
pub fn execute(config_path: &Path, all: bool, json_output: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let ledger = open_ledger(&config)?;
    let subscribers: Vec<Subscriber> = ledger
        .list_subscribers()?
        .into_iter()
        .filter(|s| all || s.active)
        .collect();

    if json_output {
        let rows: Vec<_> = subscribers.iter().map(subscriber_json).collect();
        println!("{}", serde_json::Value::Array(rows));
        return Ok(());
    }

    if subscribers.is_empty() {
        println!("No {}subscribers", if all { "" } else { "active " });
        return Ok(());
    }

    for subscriber in &subscribers {
        println!("{}", subscriber_line(subscriber));
    }
    Ok(())
}

fn subscriber_line(subscriber: &Subscriber) -> String {
    let merchant = subscriber
        .credentials
        .as_ref()
        .map_or_else(|| "not configured".to_string(), ToString::to_string);
    let last_poll = subscriber.last_poll_at.map_or_else(
        || "never".to_string(),
        |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    format!(
        "{:<14} {:<4} last poll {:<24} {}",
        subscriber.id.to_string(),
        if subscriber.active { "on" } else { "off" },
        last_poll,
        merchant
    )
}

fn subscriber_json(subscriber: &Subscriber) -> serde_json::Value {
    json!({
        "id": subscriber.id.get(),
        "active": subscriber.active,
        "domain": subscriber.credentials.as_ref().map(|c| c.domain.clone()),
        "merchant_id": subscriber.credentials.as_ref().map(|c| c.merchant_id.clone()),
        "last_poll_at": subscriber.last_poll_at.map(|at| at.to_rfc3339()),
    })
}
