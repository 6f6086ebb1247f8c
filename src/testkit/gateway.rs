//! Scripted [`PaymentGateway`] for tests.
//!
//! Responses are keyed by merchant id. Each collection has a queue of
//! one-shot results, consumed first, and a standing result returned once
//! the queue is empty (defaults to an empty list).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::item::{Order, Settlement};
use crate::domain::subscriber::MerchantCredentials;
use crate::error::GatewayError;
use crate::port::outbound::gateway::PaymentGateway;

type Response<T> = Result<Vec<T>, GatewayError>;

struct Script<T> {
    queue: VecDeque<Response<T>>,
    standing: Response<T>,
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Response<T> {
        self.queue
            .pop_front()
            .unwrap_or_else(|| self.standing.clone())
    }
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            standing: Ok(Vec::new()),
        }
    }
}

#[derive(Default)]
pub struct ScriptedGateway {
    orders: Mutex<HashMap<String, Script<Order>>>,
    settlements: Mutex<HashMap<String, Script<Settlement>>>,
    order_calls: AtomicUsize,
    settlement_calls: AtomicUsize,
    latency: Mutex<Duration>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standing order response for `merchant`.
    pub fn set_orders(&self, merchant: &str, response: Response<Order>) {
        self.orders.lock().entry(merchant.to_string()).or_default().standing = response;
    }

    /// Standing settlement response for `merchant`.
    pub fn set_settlements(&self, merchant: &str, response: Response<Settlement>) {
        self.settlements
            .lock()
            .entry(merchant.to_string())
            .or_default()
            .standing = response;
    }

    /// One-shot order response, returned before the standing one.
    pub fn push_orders(&self, merchant: &str, response: Response<Order>) {
        self.orders
            .lock()
            .entry(merchant.to_string())
            .or_default()
            .queue
            .push_back(response);
    }

    /// One-shot settlement response, returned before the standing one.
    pub fn push_settlements(&self, merchant: &str, response: Response<Settlement>) {
        self.settlements
            .lock()
            .entry(merchant.to_string())
            .or_default()
            .queue
            .push_back(response);
    }

    /// Delay applied to every call.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn order_calls(&self) -> usize {
        self.order_calls.load(Ordering::SeqCst)
    }

    pub fn settlement_calls(&self) -> usize {
        self.settlement_calls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn fetch_orders(
        &self,
        credentials: &MerchantCredentials,
    ) -> Result<Vec<Order>, GatewayError> {
        self.order_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.orders
            .lock()
            .entry(credentials.merchant_id.clone())
            .or_default()
            .next()
    }

    async fn fetch_settlements(
        &self,
        credentials: &MerchantCredentials,
    ) -> Result<Vec<Settlement>, GatewayError> {
        self.settlement_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.settlements
            .lock()
            .entry(credentials.merchant_id.clone())
            .or_default()
            .next()
    }
}
