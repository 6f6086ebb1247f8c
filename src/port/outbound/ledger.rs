//! Persistence port: notification ledger and subscriber registry.
//!
//! Keys are partitioned by subscriber and each subscriber has exactly one
//! worker, so the `is_notified` / `mark_notified` sequence does not need to
//! be atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::id::SubscriberId;
use crate::domain::item::ItemKey;
use crate::domain::subscriber::{MerchantCredentials, Subscriber};
use crate::error::LedgerError;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Whether `item` has already been delivered to `subscriber`.
    async fn is_notified(
        &self,
        subscriber: SubscriberId,
        item: &ItemKey,
    ) -> Result<bool, LedgerError>;

    /// Record a successful delivery. Must only be called after the
    /// notifier reported success. Recording twice is not an error.
    async fn mark_notified(&self, subscriber: SubscriberId, item: &ItemKey)
        -> Result<(), LedgerError>;

    /// Subscribers with notifications switched on.
    async fn active_subscribers(&self) -> Result<Vec<SubscriberId>, LedgerError>;

    async fn update_last_poll(&self, subscriber: SubscriberId) -> Result<(), LedgerError>;

    async fn set_active(&self, subscriber: SubscriberId, active: bool) -> Result<(), LedgerError>;

    async fn credentials(
        &self,
        subscriber: SubscriberId,
    ) -> Result<Option<MerchantCredentials>, LedgerError>;

    async fn save_credentials(
        &self,
        subscriber: SubscriberId,
        credentials: &MerchantCredentials,
    ) -> Result<(), LedgerError>;

    /// Full subscriber state, or `None` if the subscriber is unknown.
    async fn subscriber(&self, subscriber: SubscriberId)
        -> Result<Option<Subscriber>, LedgerError>;

    /// Delete notification records older than `cutoff`.
    ///
    /// Returns the number of records removed.
    async fn prune_notifications(&self, cutoff: DateTime<Utc>) -> Result<usize, LedgerError>;
}
