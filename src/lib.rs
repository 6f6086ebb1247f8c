//! epaywatch - per-merchant polling of epay gateways with idempotent
//! Telegram notifications.
//!
//! Each subscriber (a Telegram chat) owns one polling job. A job fetches the
//! most recent orders and settlements from the merchant's gateway, skips the
//! scan when nothing changed, and delivers every successful item exactly once
//! as recorded in the SQLite ledger.
//!
//! # Modules
//!
//! - [`domain`] - Items, subscribers and credentials
//! - [`port`] - Inbound and outbound traits
//! - [`application`] - Adaptive polling, change detection, notification gate, retention
//! - [`adapter`] - Epay HTTP client, SQLite ledger, notifiers, CLI
//! - [`infrastructure`] - Configuration and the composition root
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `telegram` (default) - Telegram notifier and bot commands
//! - `testkit` - In-memory fakes for integration tests
//!
//! # Example
//!
//! ```no_run
//! use epaywatch::infrastructure::{bootstrap, config::settings::Config};
//!
//! # async fn demo() -> epaywatch::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! config.init_logging();
//! bootstrap::run(config).await
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
