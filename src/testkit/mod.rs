//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`gateway`] - `ScriptedGateway`, a [`PaymentGateway`](crate::port::outbound::gateway::PaymentGateway)
//!   with per-merchant scripted responses.
//! - [`ledger`] - `MemoryLedger`, an in-memory [`Ledger`](crate::port::outbound::ledger::Ledger)
//!   with fault injection.
//! - [`notifier`] - `RecordingNotifier`, records deliveries and replays
//!   scripted failures.
//! - [`domain`] - Builders for orders, settlements and credentials.
//! - [`config`] - Canonical fast polling configuration.

pub mod config;
pub mod domain;
pub mod gateway;
pub mod ledger;
pub mod notifier;
