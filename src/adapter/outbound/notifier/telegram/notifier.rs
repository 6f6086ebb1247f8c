//! Telegram delivery and the inbound command listener.
//!
//! Requires the `telegram` feature to be enabled.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, ParseMode};
use teloxide::{ApiError, RequestError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::id::SubscriberId;
use crate::domain::item::RemoteItem;
use crate::error::DeliveryError;
use crate::port::outbound::notifier::Notifier;

use super::command::{bot_commands, command_help, parse_command, CommandParseError};
use super::control::TelegramControl;
use super::format::format_item_message;

/// Configuration for the Telegram notifier.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API token obtained from BotFather.
    pub bot_token: String,
    /// Pin settlement messages without a notification sound.
    pub pin_settlements: bool,
}

impl TelegramConfig {
    /// Create configuration from the `TELEGRAM_BOT_TOKEN` environment variable.
    ///
    /// Returns `None` if the token is missing or empty.
    #[must_use]
    pub fn from_env(pin_settlements: bool) -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        if bot_token.trim().is_empty() {
            return None;
        }
        Some(Self {
            bot_token,
            pin_settlements,
        })
    }
}

/// Sends item notifications to the subscriber's chat.
pub struct TelegramNotifier {
    bot: Bot,
    pin_settlements: bool,
}

impl TelegramNotifier {
    #[must_use]
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(&config.bot_token),
            pin_settlements: config.pin_settlements,
        }
    }

    /// The underlying bot handle, shared with the command listener.
    #[must_use]
    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(
        &self,
        subscriber: SubscriberId,
        item: &RemoteItem,
    ) -> Result<(), DeliveryError> {
        let chat_id = ChatId(subscriber.get());
        let text = format_item_message(item);

        let sent = self
            .bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::MarkdownV2)
            .await
            .map_err(|e| classify(&e))?;

        if self.pin_settlements && matches!(item, RemoteItem::Settlement(_)) {
            // The message is already delivered; a failed pin (e.g. missing
            // rights in a group) must not turn the delivery into a retry.
            if let Err(e) = self
                .bot
                .pin_chat_message(chat_id, sent.id)
                .disable_notification(true)
                .await
            {
                warn!(
                    subscriber = %subscriber,
                    item = %item.id(),
                    error = %e,
                    "Failed to pin settlement message"
                );
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

/// Map a Bot API failure onto the delivery taxonomy.
#[must_use]
pub fn classify(err: &RequestError) -> DeliveryError {
    let message = err.to_string();
    match err {
        RequestError::Api(
            ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::UserDeactivated
            | ApiError::ChatNotFound
            | ApiError::CantInitiateConversation,
        ) => DeliveryError::RecipientUnreachable(message),
        RequestError::Api(_) if is_unreachable_message(&message) => {
            DeliveryError::RecipientUnreachable(message)
        }
        _ => DeliveryError::Transient(message),
    }
}

/// Error descriptions that mean the chat can no longer receive messages.
#[must_use]
pub fn is_unreachable_message(message: &str) -> bool {
    let message = message.to_lowercase();
    [
        "forbidden",
        "bot was blocked",
        "user is deactivated",
        "chat not found",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}

/// Spawn the inbound command listener.
///
/// Each chat that talks to the bot is treated as its own subscriber.
pub fn spawn_command_listener(bot: Bot, control: TelegramControl) -> JoinHandle<()> {
    let control = Arc::new(control);
    tokio::spawn(async move {
        if let Err(e) = register_bot_commands(&bot).await {
            warn!(error = %e, "Failed to register bot commands with Telegram");
        }
        info!("Telegram command listener started");

        teloxide::repl(bot, move |bot: Bot, msg: Message| {
            let control = Arc::clone(&control);
            async move {
                let Some(text) = msg.text() else {
                    return respond(());
                };
                let subscriber = SubscriberId::new(msg.chat.id.0);

                let response = match parse_command(text) {
                    Ok(command) => {
                        debug!(subscriber = %subscriber, command = ?command, "Telegram command");
                        control.execute(subscriber, command).await
                    }
                    Err(CommandParseError::NotACommand) => return respond(()),
                    Err(err) => format!("Invalid command: {err}\n\n{}", command_help()),
                };

                if let Err(e) = bot.send_message(msg.chat.id, response).await {
                    error!(
                        subscriber = %subscriber,
                        error = %e,
                        "Failed to send Telegram command response"
                    );
                }
                respond(())
            }
        })
        .await;

        info!("Telegram command listener stopped");
    })
}

/// Register bot commands with Telegram for the "/" menu.
async fn register_bot_commands(bot: &Bot) -> Result<(), RequestError> {
    let commands: Vec<BotCommand> = bot_commands()
        .into_iter()
        .map(|(cmd, desc)| BotCommand::new(cmd, desc))
        .collect();

    bot.set_my_commands(commands).await?;
    info!("Registered bot commands with Telegram");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_bot_is_unreachable() {
        let err = RequestError::Api(ApiError::BotBlocked);
        assert!(classify(&err).is_permanent());
    }

    #[test]
    fn unknown_forbidden_error_is_unreachable() {
        let err = RequestError::Api(ApiError::Unknown(
            "Forbidden: bot can't send messages to bots".into(),
        ));
        assert!(classify(&err).is_permanent());
    }

    #[test]
    fn other_api_errors_are_transient() {
        let err = RequestError::Api(ApiError::MessageIsTooLong);
        assert!(!classify(&err).is_permanent());
    }

    #[test]
    fn unreachable_message_matching_is_case_insensitive() {
        assert!(is_unreachable_message("Bad Request: CHAT NOT FOUND"));
        assert!(!is_unreachable_message("Too Many Requests: retry after 5"));
    }

    #[test]
    fn from_env_requires_token() {
        // Only asserts the absent case; setting process env in parallel tests races.
        if std::env::var("TELEGRAM_BOT_TOKEN").is_err() {
            assert!(TelegramConfig::from_env(true).is_none());
        }
    }
}
