//! Telegram command execution against the ledger and the job registry.
//!
//! Every chat is its own subscriber: commands only ever read or change the
//! state of the chat they were sent from.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::id::SubscriberId;
use crate::domain::subscriber::MerchantCredentials;
use crate::port::inbound::polling::PollingControl;
use crate::port::outbound::gateway::PaymentGateway;
use crate::port::outbound::ledger::Ledger;

use super::command::{command_help, TelegramCommand};
use super::format::{format_order_list, format_settlement_list};

/// Maximum items listed by `/orders` and `/settlements`.
const LIST_LIMIT: usize = 10;

const SETUP_FIRST: &str = "❌ No merchant configured. Use /setup <domain> <merchant_id> <key> first.";
const STORAGE_FAILED: &str = "❌ Storage is unavailable, please try again later.";

/// Runtime command executor for Telegram control commands.
#[derive(Clone)]
pub struct TelegramControl {
    polling: Arc<dyn PollingControl>,
    ledger: Arc<dyn Ledger>,
    gateway: Arc<dyn PaymentGateway>,
}

impl TelegramControl {
    #[must_use]
    pub fn new(
        polling: Arc<dyn PollingControl>,
        ledger: Arc<dyn Ledger>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            polling,
            ledger,
            gateway,
        }
    }

    /// Execute one parsed command for `subscriber` and return response text.
    pub async fn execute(&self, subscriber: SubscriberId, command: TelegramCommand) -> String {
        match command {
            TelegramCommand::Start => self.start_text(subscriber).await,
            TelegramCommand::Help => command_help().to_string(),
            TelegramCommand::Status => self.status_text(subscriber).await,
            TelegramCommand::Setup(credentials) => self.setup(subscriber, credentials).await,
            TelegramCommand::Notify { enabled } => self.notify(subscriber, enabled).await,
            TelegramCommand::Orders { success_only } => {
                self.orders_text(subscriber, success_only).await
            }
            TelegramCommand::Settlements => self.settlements_text(subscriber).await,
        }
    }

    async fn start_text(&self, subscriber: SubscriberId) -> String {
        let greeting = "👋 Welcome! I watch your epay merchant account and \
            notify you about new payments and settlements.";
        match self.ledger.credentials(subscriber).await {
            Ok(Some(credentials)) => {
                format!("{greeting}\n\n{}\n\n{}", merchant_text(&credentials), command_help())
            }
            _ => format!("{greeting}\n\n{}", command_help()),
        }
    }

    async fn status_text(&self, subscriber: SubscriberId) -> String {
        let state = match self.ledger.subscriber(subscriber).await {
            Ok(state) => state,
            Err(e) => {
                warn!(subscriber = %subscriber, error = %e, "Status lookup failed");
                return STORAGE_FAILED.to_string();
            }
        };
        let Some(state) = state else {
            return SETUP_FIRST.to_string();
        };

        let merchant = state
            .credentials
            .as_ref()
            .map_or_else(|| "🔐 Merchant: not configured".to_string(), merchant_text);
        let notifications = if state.active { "on" } else { "off" };
        let worker = if self.polling.is_running(subscriber) {
            "running"
        } else {
            "stopped"
        };
        let last_poll = state.last_poll_at.map_or_else(
            || "never".to_string(),
            |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );

        format!(
            "{merchant}\n\n🔔 Notifications: {notifications}\n⚙️ Poller: {worker}\n🕒 Last poll: {last_poll}"
        )
    }

    async fn setup(&self, subscriber: SubscriberId, credentials: MerchantCredentials) -> String {
        if let Err(e) = self.ledger.save_credentials(subscriber, &credentials).await {
            warn!(subscriber = %subscriber, error = %e, "Failed to save credentials");
            return STORAGE_FAILED.to_string();
        }
        info!(subscriber = %subscriber, domain = %credentials.domain, "Merchant configured");

        format!(
            "✅ Merchant saved.\n\n{}\n\nUse /notify on to start notifications. \
            You may want to delete the message containing your key.",
            merchant_text(&credentials)
        )
    }

    async fn notify(&self, subscriber: SubscriberId, enabled: bool) -> String {
        if enabled {
            match self.ledger.credentials(subscriber).await {
                Ok(Some(_)) => {}
                Ok(None) => return SETUP_FIRST.to_string(),
                Err(e) => {
                    warn!(subscriber = %subscriber, error = %e, "Credentials lookup failed");
                    return STORAGE_FAILED.to_string();
                }
            }
        }

        if let Err(e) = self.ledger.set_active(subscriber, enabled).await {
            warn!(subscriber = %subscriber, error = %e, "Failed to persist notification switch");
            return STORAGE_FAILED.to_string();
        }

        if enabled {
            // `start` is refused for a live entry, which resumes on its own
            // once it sees the flag set above.
            if self.polling.start(subscriber) || self.polling.is_running(subscriber) {
                "✅ Notifications on. New successful payments and settlements will be sent here."
                    .to_string()
            } else {
                warn!(subscriber = %subscriber, "Notifications enabled but polling is shut down");
                "✅ Notifications on. Polling resumes when the service restarts.".to_string()
            }
        } else {
            self.polling.stop(subscriber).await;
            "✅ Notifications off.".to_string()
        }
    }

    async fn orders_text(&self, subscriber: SubscriberId, success_only: bool) -> String {
        let credentials = match self.require_credentials(subscriber).await {
            Ok(credentials) => credentials,
            Err(text) => return text,
        };
        match self.gateway.fetch_orders(&credentials).await {
            Ok(orders) => format_order_list(&orders, success_only, LIST_LIMIT),
            Err(e) => format!("❌ Query failed: {e}"),
        }
    }

    async fn settlements_text(&self, subscriber: SubscriberId) -> String {
        let credentials = match self.require_credentials(subscriber).await {
            Ok(credentials) => credentials,
            Err(text) => return text,
        };
        match self.gateway.fetch_settlements(&credentials).await {
            Ok(settlements) => format_settlement_list(&settlements, LIST_LIMIT),
            Err(e) => format!("❌ Query failed: {e}"),
        }
    }

    async fn require_credentials(
        &self,
        subscriber: SubscriberId,
    ) -> Result<MerchantCredentials, String> {
        match self.ledger.credentials(subscriber).await {
            Ok(Some(credentials)) => Ok(credentials),
            Ok(None) => Err(SETUP_FIRST.to_string()),
            Err(e) => {
                warn!(subscriber = %subscriber, error = %e, "Credentials lookup failed");
                Err(STORAGE_FAILED.to_string())
            }
        }
    }
}

fn merchant_text(credentials: &MerchantCredentials) -> String {
    format!(
        "🔐 Merchant\n🌐 Domain: {}\n🆔 Merchant id: {}\n🔑 Key: {}",
        credentials.domain,
        credentials.merchant_id,
        credentials.masked_key()
    )
}
