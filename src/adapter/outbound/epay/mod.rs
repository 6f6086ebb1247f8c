//! Epay merchant query API adapter.
//!
//! Implements [`PaymentGateway`](crate::port::outbound::gateway::PaymentGateway)
//! over `GET https://{domain}/api.php?act=orders|settle&pid=..&key=..&limit=..`.

pub mod client;
pub mod dto;
pub mod settings;

pub use client::EpayClient;
pub use settings::EpayConfig;
