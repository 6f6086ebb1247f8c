//! In-memory [`Ledger`] with fault injection.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::domain::id::SubscriberId;
use crate::domain::item::ItemKey;
use crate::domain::subscriber::{MerchantCredentials, Subscriber};
use crate::error::LedgerError;
use crate::port::outbound::ledger::Ledger;

/// Ledger backed by plain maps.
///
/// `fail_marks` / `fail_lookups` make the corresponding calls return the
/// given error until cleared with `None`. `hold_deactivations` parks every
/// `set_active(_, false)` after it is applied, until released.
#[derive(Default)]
pub struct MemoryLedger {
    notified: Mutex<HashMap<(SubscriberId, ItemKey), DateTime<Utc>>>,
    subscribers: Mutex<BTreeMap<SubscriberId, Subscriber>>,
    mark_failure: Mutex<Option<LedgerError>>,
    lookup_failure: Mutex<Option<LedgerError>>,
    writes: AtomicUsize,
    lookups: AtomicUsize,
    deactivation_hold: Mutex<Option<Arc<Notify>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register an active subscriber with credentials.
    #[must_use]
    pub fn with_subscriber(self, id: SubscriberId, credentials: MerchantCredentials) -> Self {
        self.subscribers.lock().insert(
            id,
            Subscriber {
                id,
                credentials: Some(credentials),
                active: true,
                last_poll_at: None,
            },
        );
        self
    }

    pub fn seed_notified(&self, subscriber: SubscriberId, key: ItemKey) {
        self.seed_notified_at(subscriber, key, Utc::now());
    }

    pub fn seed_notified_at(&self, subscriber: SubscriberId, key: ItemKey, at: DateTime<Utc>) {
        self.notified.lock().insert((subscriber, key), at);
    }

    pub fn contains(&self, subscriber: SubscriberId, key: &ItemKey) -> bool {
        self.notified.lock().contains_key(&(subscriber, key.clone()))
    }

    pub fn notified_count(&self) -> usize {
        self.notified.lock().len()
    }

    pub fn is_active(&self, subscriber: SubscriberId) -> bool {
        self.subscribers
            .lock()
            .get(&subscriber)
            .is_some_and(|s| s.active)
    }

    pub fn last_poll_at(&self, subscriber: SubscriberId) -> Option<DateTime<Utc>> {
        self.subscribers
            .lock()
            .get(&subscriber)
            .and_then(|s| s.last_poll_at)
    }

    /// Number of successful `mark_notified` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of `is_notified` calls, failed ones included.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// From now on, `set_active(_, false)` returns only after the returned
    /// handle is notified, one permit per call.
    pub fn hold_deactivations(&self) -> Arc<Notify> {
        let hold = Arc::new(Notify::new());
        *self.deactivation_hold.lock() = Some(Arc::clone(&hold));
        hold
    }

    pub fn fail_marks(&self, error: Option<LedgerError>) {
        *self.mark_failure.lock() = error;
    }

    pub fn fail_lookups(&self, error: Option<LedgerError>) {
        *self.lookup_failure.lock() = error;
    }

    fn entry(&self, id: SubscriberId, update: impl FnOnce(&mut Subscriber)) {
        let mut subscribers = self.subscribers.lock();
        let subscriber = subscribers.entry(id).or_insert_with(|| Subscriber {
            id,
            credentials: None,
            active: false,
            last_poll_at: None,
        });
        update(subscriber);
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn is_notified(
        &self,
        subscriber: SubscriberId,
        item: &ItemKey,
    ) -> Result<bool, LedgerError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.lookup_failure.lock().clone() {
            return Err(e);
        }
        Ok(self.contains(subscriber, item))
    }

    async fn mark_notified(
        &self,
        subscriber: SubscriberId,
        item: &ItemKey,
    ) -> Result<(), LedgerError> {
        if let Some(e) = self.mark_failure.lock().clone() {
            return Err(e);
        }
        self.notified
            .lock()
            .entry((subscriber, item.clone()))
            .or_insert_with(Utc::now);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn active_subscribers(&self) -> Result<Vec<SubscriberId>, LedgerError> {
        Ok(self
            .subscribers
            .lock()
            .values()
            .filter(|s| s.active)
            .map(|s| s.id)
            .collect())
    }

    async fn update_last_poll(&self, subscriber: SubscriberId) -> Result<(), LedgerError> {
        self.entry(subscriber, |s| s.last_poll_at = Some(Utc::now()));
        Ok(())
    }

    async fn set_active(&self, subscriber: SubscriberId, active: bool) -> Result<(), LedgerError> {
        self.entry(subscriber, |s| s.active = active);
        if !active {
            let hold = self.deactivation_hold.lock().clone();
            if let Some(hold) = hold {
                hold.notified().await;
            }
        }
        Ok(())
    }

    async fn credentials(
        &self,
        subscriber: SubscriberId,
    ) -> Result<Option<MerchantCredentials>, LedgerError> {
        if let Some(e) = self.lookup_failure.lock().clone() {
            return Err(e);
        }
        Ok(self
            .subscribers
            .lock()
            .get(&subscriber)
            .and_then(|s| s.credentials.clone()))
    }

    async fn save_credentials(
        &self,
        subscriber: SubscriberId,
        credentials: &MerchantCredentials,
    ) -> Result<(), LedgerError> {
        self.entry(subscriber, |s| s.credentials = Some(credentials.clone()));
        Ok(())
    }

    async fn subscriber(
        &self,
        subscriber: SubscriberId,
    ) -> Result<Option<Subscriber>, LedgerError> {
        Ok(self.subscribers.lock().get(&subscriber).cloned())
    }

    async fn prune_notifications(&self, cutoff: DateTime<Utc>) -> Result<usize, LedgerError> {
        let mut notified = self.notified.lock();
        let before = notified.len();
        notified.retain(|_, at| *at >= cutoff);
        Ok(before - notified.len())
    }
}
