//! Telegram notification configuration.

use serde::Deserialize;

const fn default_true() -> bool {
    true
}

/// `[telegram]` section. The bot token is read from `TELEGRAM_BOT_TOKEN`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TelegramAppConfig {
    /// Deliver through Telegram and listen for bot commands.
    #[serde(default)]
    pub enabled: bool,
    /// Pin settlement messages silently.
    #[serde(default = "default_true")]
    pub pin_settlements: bool,
}

impl Default for TelegramAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pin_settlements: default_true(),
        }
    }
}
