//! Periodic pruning of old notification records.
//!
//! Records only guard against re-delivery of items the gateway still
//! returns. The query API lists the most recent items, so records older
//! than the retention window can be dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::port::outbound::ledger::Ledger;

/// How long records are kept and how often the sweep runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub keep_days: u32,
    pub sweep_interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_days: 730,
            sweep_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl RetentionPolicy {
    /// Records notified before this instant are eligible for deletion.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - chrono::Duration::days(i64::from(self.keep_days))
    }
}

/// Delete every record older than the policy allows.
pub async fn prune_once(
    ledger: &dyn Ledger,
    policy: RetentionPolicy,
) -> Result<usize, LedgerError> {
    let cutoff = policy.cutoff(Utc::now());
    let removed = ledger.prune_notifications(cutoff).await?;
    info!(removed, cutoff = %cutoff, "Pruned notification records");
    Ok(removed)
}

/// Run [`prune_once`] on a fixed interval until `shutdown` flips to true.
///
/// The first sweep runs immediately.
pub fn spawn_sweeper(
    ledger: Arc<dyn Ledger>,
    policy: RetentionPolicy,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(policy.sweep_interval);
        loop {
            tokio::select! {
                biased;
                _ = async {
                    // `watch::Ref` is not `Send` and must not outlive this arm.
                    let _ = shutdown.wait_for(|stop| *stop).await;
                } => break,
                _ = ticker.tick() => {
                    if let Err(e) = prune_once(ledger.as_ref(), policy).await {
                        warn!(error = %e, "Retention sweep failed");
                    }
                }
            }
        }
        info!("Retention sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::SubscriberId;
    use crate::domain::item::{ItemKey, ItemKind};
    use crate::testkit::ledger::MemoryLedger;

    const SUB: SubscriberId = SubscriberId::new(1);

    #[test]
    fn cutoff_subtracts_keep_days() {
        let now = Utc::now();
        let policy = RetentionPolicy {
            keep_days: 30,
            ..RetentionPolicy::default()
        };
        assert_eq!(now - policy.cutoff(now), chrono::Duration::days(30));
    }

    #[tokio::test]
    async fn prune_once_removes_only_expired_records() {
        let ledger = MemoryLedger::new();
        let old = Utc::now() - chrono::Duration::days(800);
        ledger.seed_notified_at(SUB, ItemKey::new(ItemKind::Order, "OLD"), old);
        ledger.seed_notified(SUB, ItemKey::new(ItemKind::Order, "NEW"));

        let removed = prune_once(&ledger, RetentionPolicy::default()).await.unwrap();

        assert_eq!(removed, 1);
        assert!(ledger.contains(SUB, &ItemKey::new(ItemKind::Order, "NEW")));
    }

    #[tokio::test]
    async fn sweeper_stops_on_shutdown() {
        let ledger = Arc::new(MemoryLedger::new());
        let (tx, rx) = watch::channel(false);
        let handle = spawn_sweeper(ledger, RetentionPolicy::default(), rx);

        tx.send_replace(true);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
    #[tokio::test]
    async fn sweeper_prunes_until_shutdown() {
        let ledger = Arc::new(MemoryLedger::new());
        let old = Utc::now() - chrono::Duration::days(800);
        ledger.seed_notified_at(SUB, ItemKey::new(ItemKind::Order, "T1"), old);
        let (tx, rx) = watch::channel(false);
        let handle = spawn_sweeper(ledger.clone(), RetentionPolicy::default(), rx);

        tokio::time::timeout(Duration::from_secs(1), async {
            while ledger.notified_count() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("first sweep should run immediately");

        tx.send_replace(true);
        handle.await.unwrap();
    }
}
