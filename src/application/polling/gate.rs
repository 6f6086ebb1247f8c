//! At-most-once delivery gate.
//!
//! For every successful item: ask the ledger, deliver if absent, and only
//! then record the delivery. A ledger write that fails after a successful
//! delivery leaves the item unresolved, so it is retried (and may be sent
//! twice) rather than silently dropped.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use super::signal::StopSignal;
use crate::domain::id::SubscriberId;
use crate::domain::item::RemoteItem;
use crate::error::DeliveryError;
use crate::port::outbound::ledger::Ledger;
use crate::port::outbound::notifier::Notifier;

/// Result of scanning one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Items with a success status.
    pub eligible: usize,
    /// Items delivered and recorded in this scan.
    pub delivered: usize,
    /// Items the ledger already knew about.
    pub already_notified: usize,
    /// Items left for the next cycle after a transient failure.
    pub unresolved: usize,
    /// The notifier reported the recipient as unreachable; scanning stopped.
    pub unreachable: bool,
    /// A stop was requested mid-scan; remaining items were not visited.
    pub cancelled: bool,
}

impl ScanOutcome {
    /// Every eligible item reached notified or already-notified.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unresolved == 0 && !self.unreachable && !self.cancelled
    }
}

enum Admission {
    AlreadyNotified,
    Delivered,
    Unresolved,
    Unreachable,
    Cancelled,
}

/// Enforces at-most-once delivery of items to one subscriber.
pub struct NotificationGate {
    subscriber: SubscriberId,
    ledger: Arc<dyn Ledger>,
    notifier: Arc<dyn Notifier>,
    delivery_timeout: Duration,
}

impl NotificationGate {
    pub fn new(
        subscriber: SubscriberId,
        ledger: Arc<dyn Ledger>,
        notifier: Arc<dyn Notifier>,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            subscriber,
            ledger,
            notifier,
            delivery_timeout,
        }
    }

    /// Scan items in order, delivering each unseen successful item.
    ///
    /// Stops early on an unreachable recipient or a stop request.
    pub async fn scan(&self, items: &[RemoteItem], signal: &StopSignal) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for item in items.iter().filter(|item| item.is_success()) {
            outcome.eligible += 1;
            match self.admit(item, signal).await {
                Admission::AlreadyNotified => outcome.already_notified += 1,
                Admission::Delivered => outcome.delivered += 1,
                Admission::Unresolved => outcome.unresolved += 1,
                Admission::Unreachable => {
                    outcome.unreachable = true;
                    break;
                }
                Admission::Cancelled => {
                    outcome.cancelled = true;
                    break;
                }
            }
        }

        outcome
    }

    async fn admit(&self, item: &RemoteItem, signal: &StopSignal) -> Admission {
        let key = item.key();

        match self.ledger.is_notified(self.subscriber, &key).await {
            Ok(true) => return Admission::AlreadyNotified,
            Ok(false) => {}
            Err(e) => {
                warn!(
                    subscriber = %self.subscriber,
                    item = %key,
                    error = %e,
                    "Ledger lookup failed, leaving item unresolved"
                );
                return Admission::Unresolved;
            }
        }

        if signal.is_stopped() {
            return Admission::Cancelled;
        }

        let attempt = self.notifier.deliver(self.subscriber, item);
        let delivery = match tokio::time::timeout(self.delivery_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Transient(format!(
                "delivery timed out after {:?}",
                self.delivery_timeout
            ))),
        };

        match delivery {
            Ok(()) => {}
            Err(e) if e.is_permanent() => {
                warn!(
                    subscriber = %self.subscriber,
                    item = %key,
                    notifier = self.notifier.name(),
                    error = %e,
                    "Recipient unreachable"
                );
                return Admission::Unreachable;
            }
            Err(e) => {
                warn!(
                    subscriber = %self.subscriber,
                    item = %key,
                    notifier = self.notifier.name(),
                    error = %e,
                    "Delivery failed, will retry next cycle"
                );
                return Admission::Unresolved;
            }
        }

        match self.ledger.mark_notified(self.subscriber, &key).await {
            Ok(()) => {
                debug!(subscriber = %self.subscriber, item = %key, "Notified");
                Admission::Delivered
            }
            Err(e) => {
                error!(
                    subscriber = %self.subscriber,
                    item = %key,
                    error = %e,
                    "Delivered but not recorded; item will be retried and may repeat"
                );
                Admission::Unresolved
            }
        }
    }
}
