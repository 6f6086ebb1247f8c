//! SQLite persistence adapter.
//!
//! Implements the [`Ledger`](crate::port::outbound::ledger::Ledger) port with
//! Diesel over an r2d2 connection pool.

pub mod database;
pub mod ledger;

pub use database::connection::{create_pool, run_migrations, DbPool};
pub use ledger::SqliteLedger;
