//! Notifier that writes deliveries to the log.
//!
//! Used when Telegram is disabled, e.g. to dry-run a gateway setup.

use async_trait::async_trait;
use tracing::info;

use crate::domain::id::SubscriberId;
use crate::domain::item::RemoteItem;
use crate::error::DeliveryError;
use crate::port::outbound::notifier::Notifier;

/// Always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl LogNotifier {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(
        &self,
        subscriber: SubscriberId,
        item: &RemoteItem,
    ) -> Result<(), DeliveryError> {
        info!(
            subscriber = %subscriber,
            kind = %item.kind(),
            item = %item.id(),
            amount = %item.amount(),
            "New successful item"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::order;

    #[tokio::test]
    async fn log_notifier_always_delivers() {
        let item = RemoteItem::from(order("T1", "1"));
        assert!(LogNotifier::new()
            .deliver(SubscriberId::new(1), &item)
            .await
            .is_ok());
    }
}
