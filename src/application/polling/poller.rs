//! Per-subscriber worker loop.
//!
//! One cycle: load credentials, fetch orders and settlements concurrently,
//! skip collections whose result set is unchanged and was fully handled,
//! scan the rest through the [`NotificationGate`], then derive the next wait
//! from the [`BackoffController`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use super::backoff::BackoffController;
use super::config::PollingConfig;
use super::detector::{ChangeDetector, Signature};
use super::gate::{NotificationGate, ScanOutcome};
use super::signal::StopSignal;
use crate::domain::id::SubscriberId;
use crate::domain::item::{ItemKind, RemoteItem};
use crate::error::GatewayError;
use crate::port::outbound::gateway::PaymentGateway;
use crate::port::outbound::ledger::Ledger;
use crate::port::outbound::notifier::Notifier;

/// Collaborators shared by every worker.
#[derive(Clone)]
pub struct PollerDeps {
    pub gateway: Arc<dyn PaymentGateway>,
    pub ledger: Arc<dyn Ledger>,
    pub notifier: Arc<dyn Notifier>,
}

/// Where a worker is within its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    Evaluating,
    Notifying,
    Rescheduling,
    Stopped,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Evaluating => "evaluating",
            Self::Notifying => "notifying",
            Self::Rescheduling => "rescheduling",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Result of a single [`AdaptivePoller::poll_once`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ran to the end. `full_pass` is false if either fetch failed.
    Completed { full_pass: bool, interval: Duration },
    /// No credentials stored; retried after the credentials wait.
    MissingCredentials,
    /// A stop was requested before the cycle finished.
    Cancelled,
    /// The recipient is unreachable and the subscriber was deactivated.
    Deactivated,
}

/// Why a worker's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    RecipientUnreachable,
}

/// Polls one subscriber's gateway account until stopped.
pub struct AdaptivePoller {
    subscriber: SubscriberId,
    deps: PollerDeps,
    config: PollingConfig,
    backoff: BackoffController,
    orders: ChangeDetector,
    settlements: ChangeDetector,
    gate: NotificationGate,
    last_poll_recorded: Option<Instant>,
    state: PollState,
    next_wait: Duration,
}

impl AdaptivePoller {
    pub fn new(subscriber: SubscriberId, deps: PollerDeps, config: PollingConfig) -> Self {
        let gate = NotificationGate::new(
            subscriber,
            deps.ledger.clone(),
            deps.notifier.clone(),
            config.delivery_timeout,
        );
        let backoff = BackoffController::new(
            config.base_interval,
            config.degraded_interval,
            config.error_threshold,
        );
        let next_wait = config.base_interval;

        Self {
            subscriber,
            deps,
            config,
            backoff,
            orders: ChangeDetector::new(),
            settlements: ChangeDetector::new(),
            gate,
            last_poll_recorded: None,
            state: PollState::Idle,
            next_wait,
        }
    }

    #[must_use]
    pub const fn subscriber(&self) -> SubscriberId {
        self.subscriber
    }

    #[must_use]
    pub const fn state(&self) -> PollState {
        self.state
    }

    /// Wait before the next cycle.
    #[must_use]
    pub const fn next_wait(&self) -> Duration {
        self.next_wait
    }

    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.backoff.consecutive_failures()
    }

    #[must_use]
    pub fn detector(&self, kind: ItemKind) -> &ChangeDetector {
        match kind {
            ItemKind::Order => &self.orders,
            ItemKind::Settlement => &self.settlements,
        }
    }

    /// Run cycles until the signal fires or the recipient becomes
    /// unreachable. The first cycle starts after one base interval.
    pub async fn run(&mut self, mut signal: StopSignal) -> StopReason {
        info!(subscriber = %self.subscriber, "Polling started");

        let reason = loop {
            self.state = PollState::Idle;

            tokio::select! {
                biased;
                () = signal.stopped() => break StopReason::Cancelled,
                () = tokio::time::sleep(self.next_wait) => {}
            }

            match self.poll_once(&mut signal).await {
                CycleOutcome::Cancelled => break StopReason::Cancelled,
                CycleOutcome::Deactivated => break StopReason::RecipientUnreachable,
                CycleOutcome::Completed { .. } | CycleOutcome::MissingCredentials => {}
            }
        };

        self.state = PollState::Stopped;
        info!(subscriber = %self.subscriber, reason = ?reason, "Polling stopped");
        reason
    }

    /// Execute one cycle without the idle wait.
    pub async fn poll_once(&mut self, signal: &mut StopSignal) -> CycleOutcome {
        if signal.is_stopped() {
            return CycleOutcome::Cancelled;
        }

        let credentials = match self.deps.ledger.credentials(self.subscriber).await {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                warn!(subscriber = %self.subscriber, "Merchant credentials missing");
                self.next_wait = self.config.credentials_retry;
                return CycleOutcome::MissingCredentials;
            }
            Err(e) => {
                warn!(subscriber = %self.subscriber, error = %e, "Failed to load credentials");
                self.next_wait = self.config.credentials_retry;
                return CycleOutcome::MissingCredentials;
            }
        };

        self.refresh_last_poll().await;

        self.state = PollState::Fetching;
        let timeout = self.config.fetch_timeout;
        let gateway = &self.deps.gateway;
        let fetches = async {
            tokio::join!(
                bounded(timeout, gateway.fetch_orders(&credentials)),
                bounded(timeout, gateway.fetch_settlements(&credentials)),
            )
        };
        let (orders, settlements) = tokio::select! {
            biased;
            () = signal.stopped() => return CycleOutcome::Cancelled,
            results = fetches => results,
        };

        let mut full_pass = true;

        let orders = orders.map(|items| items.into_iter().map(RemoteItem::from).collect());
        match self.process(ItemKind::Order, orders, signal).await {
            Processed::Ok => {}
            Processed::FetchFailed => full_pass = false,
            Processed::Unreachable => return self.deactivate().await,
            Processed::Cancelled => return CycleOutcome::Cancelled,
        }

        let settlements =
            settlements.map(|items| items.into_iter().map(RemoteItem::from).collect());
        match self.process(ItemKind::Settlement, settlements, signal).await {
            Processed::Ok => {}
            Processed::FetchFailed => full_pass = false,
            Processed::Unreachable => return self.deactivate().await,
            Processed::Cancelled => return CycleOutcome::Cancelled,
        }

        self.state = PollState::Rescheduling;
        let was_degraded = self.backoff.is_degraded();
        let interval = self.backoff.record(full_pass);
        if self.backoff.is_degraded() && !was_degraded {
            warn!(
                subscriber = %self.subscriber,
                failures = self.backoff.consecutive_failures(),
                interval = ?interval,
                "Gateway keeps failing, slowing down"
            );
        } else if was_degraded && !self.backoff.is_degraded() {
            info!(subscriber = %self.subscriber, interval = ?interval, "Gateway recovered");
        }
        self.next_wait = interval;

        CycleOutcome::Completed {
            full_pass,
            interval,
        }
    }

    async fn process(
        &mut self,
        kind: ItemKind,
        fetched: Result<Vec<RemoteItem>, GatewayError>,
        signal: &StopSignal,
    ) -> Processed {
        let items = match fetched {
            Ok(items) => items,
            Err(e) => {
                warn!(subscriber = %self.subscriber, kind = %kind, error = %e, "Fetch failed");
                return Processed::FetchFailed;
            }
        };

        self.state = PollState::Evaluating;
        let signature = Signature::compute(&items);
        let detector = match kind {
            ItemKind::Order => &self.orders,
            ItemKind::Settlement => &self.settlements,
        };
        if !detector.needs_scan(&signature) {
            trace!(subscriber = %self.subscriber, kind = %kind, signature = %signature, "Unchanged");
            return Processed::Ok;
        }

        self.state = PollState::Notifying;
        let outcome: ScanOutcome = self.gate.scan(&items, signal).await;
        debug!(
            subscriber = %self.subscriber,
            kind = %kind,
            signature = %signature,
            fetched = items.len(),
            eligible = outcome.eligible,
            delivered = outcome.delivered,
            unresolved = outcome.unresolved,
            "Scanned"
        );

        if outcome.unreachable {
            return Processed::Unreachable;
        }
        if outcome.cancelled {
            return Processed::Cancelled;
        }

        let clean = outcome.is_clean();
        match kind {
            ItemKind::Order => self.orders.record(signature, clean),
            ItemKind::Settlement => self.settlements.record(signature, clean),
        }
        Processed::Ok
    }

    async fn refresh_last_poll(&mut self) {
        let due = self
            .last_poll_recorded
            .map_or(true, |at| at.elapsed() >= self.config.last_poll_refresh);
        if !due {
            return;
        }

        match self.deps.ledger.update_last_poll(self.subscriber).await {
            Ok(()) => self.last_poll_recorded = Some(Instant::now()),
            Err(e) => {
                warn!(subscriber = %self.subscriber, error = %e, "Failed to update last poll time");
            }
        }
    }

    async fn deactivate(&mut self) -> CycleOutcome {
        if let Err(e) = self.deps.ledger.set_active(self.subscriber, false).await {
            error!(
                subscriber = %self.subscriber,
                error = %e,
                "Failed to persist deactivation; worker stops anyway"
            );
        } else {
            info!(subscriber = %self.subscriber, "Recipient unreachable, notifications disabled");
        }
        CycleOutcome::Deactivated
    }
}

enum Processed {
    Ok,
    FetchFailed,
    Unreachable,
    Cancelled,
}

async fn bounded<T>(
    limit: Duration,
    fetch: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    tokio::time::timeout(limit, fetch)
        .await
        .unwrap_or(Err(GatewayError::Timeout(limit)))
}
