//! Per-subscriber adaptive polling.
//!
//! # Architecture
//!
//! ```text
//! JobRegistry ──spawns──> AdaptivePoller (one task per subscriber)
//!                              │
//!                              ├── PaymentGateway::fetch_orders ──┐ concurrent,
//!                              ├── PaymentGateway::fetch_settlements ┘ independent
//!                              ├── ChangeDetector   (skip unchanged, clean result sets)
//!                              ├── NotificationGate (ledger check → deliver → record)
//!                              └── BackoffController (base / degraded interval)
//! ```
//!
//! Workers never talk to each other. They share the ledger and observe
//! their own stop signal plus the registry-wide shutdown signal.

pub mod backoff;
pub mod config;
pub mod detector;
pub mod gate;
pub mod poller;
pub mod registry;
pub mod signal;

pub use backoff::BackoffController;
pub use config::PollingConfig;
pub use detector::{ChangeDetector, Signature};
pub use gate::{NotificationGate, ScanOutcome};
pub use poller::{AdaptivePoller, CycleOutcome, PollState, PollerDeps, StopReason};
pub use registry::JobRegistry;
pub use signal::StopSignal;
