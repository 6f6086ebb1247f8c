//! Notification adapters.
//!
//! Implements the [`Notifier`](crate::port::outbound::notifier::Notifier)
//! port for Telegram and for plain log output.

pub mod log;

#[cfg(feature = "telegram")]
pub mod telegram;

pub use self::log::LogNotifier;
