//! Telegram notification and command handling.
//!
//! Provides the Telegram bot integration: MarkdownV2 notifications for new
//! payments and settlements, and per-chat bot commands that configure a
//! subscriber and drive its polling job.

pub mod command;
pub mod control;
pub mod format;
pub mod notifier;

pub use control::TelegramControl;
pub use notifier::{TelegramConfig, TelegramNotifier};
