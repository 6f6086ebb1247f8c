//! Application layer.
//!
//! - [`polling`] - Per-subscriber adaptive polling and idempotent notification
//! - [`retention`] - Periodic pruning of old notification records

pub mod polling;
pub mod retention;
