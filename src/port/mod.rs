//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!     UI / commands ─┤  PollingControl (in)    │
//!                    │                         │
//!                    │   application::polling  │
//!                    └─────────────────────────┘
//!            │                   │                   │
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │  Gateway   │      │   Ledger   │      │  Notifier  │
//!     │  Adapter   │      │  Adapter   │      │  Adapter   │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```

pub mod inbound;
pub mod outbound;
