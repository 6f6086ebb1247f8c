//! Notifier port for delivering item notifications to subscribers.

use async_trait::async_trait;

use crate::domain::id::SubscriberId;
use crate::domain::item::RemoteItem;
use crate::error::DeliveryError;

/// Delivers one notification to one subscriber.
///
/// Unlike a fire-and-forget event sink, `deliver` must only return `Ok`
/// once the message was accepted by the channel: the ledger records the
/// item as notified on the strength of that result.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, subscriber: SubscriberId, item: &RemoteItem)
        -> Result<(), DeliveryError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
