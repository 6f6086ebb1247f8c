//! Recording [`Notifier`] for tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::id::SubscriberId;
use crate::domain::item::RemoteItem;
use crate::error::DeliveryError;
use crate::port::outbound::notifier::Notifier;

/// Records every successful delivery and replays scripted failures.
///
/// An attempt is counted before any latency or failure is applied.
#[derive(Default)]
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<(SubscriberId, RemoteItem)>>,
    failures: Mutex<VecDeque<DeliveryError>>,
    unreachable: Mutex<HashSet<SubscriberId>>,
    latency: Mutex<Duration>,
    attempts: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next attempt with `error`. Calls queue up.
    pub fn fail_next(&self, error: DeliveryError) {
        self.failures.lock().push_back(error);
    }

    /// Every delivery to `subscriber` fails as unreachable from now on.
    pub fn mark_unreachable(&self, subscriber: SubscriberId) {
        self.unreachable.lock().insert(subscriber);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().len()
    }

    /// Ids delivered to `subscriber`, in delivery order.
    pub fn delivered_ids(&self, subscriber: SubscriberId) -> Vec<String> {
        self.deliveries
            .lock()
            .iter()
            .filter(|(sub, _)| *sub == subscriber)
            .map(|(_, item)| item.id().to_string())
            .collect()
    }

    pub fn deliveries(&self) -> Vec<(SubscriberId, RemoteItem)> {
        self.deliveries.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(
        &self,
        subscriber: SubscriberId,
        item: &RemoteItem,
    ) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.unreachable.lock().contains(&subscriber) {
            return Err(DeliveryError::RecipientUnreachable(
                "Forbidden: bot was blocked by the user".into(),
            ));
        }
        if let Some(e) = self.failures.lock().pop_front() {
            return Err(e);
        }

        self.deliveries.lock().push((subscriber, item.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
