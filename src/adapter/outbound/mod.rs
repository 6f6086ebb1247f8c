//! Outbound adapters (driven side).

pub mod epay;
pub mod notifier;
pub mod sqlite;
