//! Builders for domain primitives used across tests.
//!
//! Concise factory functions so tests focus on assertions rather than
//! construction boilerplate.

use rust_decimal::Decimal;

use crate::domain::id::ItemId;
use crate::domain::item::{ItemStatus, Order, Settlement};
use crate::domain::subscriber::MerchantCredentials;

/// An order with the given trade number and raw status code.
pub fn order(trade_no: &str, status: &str) -> Order {
    Order {
        trade_no: ItemId::from(trade_no),
        out_trade_no: format!("M-{trade_no}"),
        pay_type: "alipay".into(),
        name: "Test product".into(),
        amount: Decimal::new(1000, 2),
        status: ItemStatus::from_code(status),
        created_at: None,
        completed_at: None,
    }
}

/// A settlement with the given id, raw status code and amounts.
pub fn settlement(id: &str, status: &str, amount: Decimal, realized: Decimal) -> Settlement {
    Settlement {
        id: ItemId::from(id),
        account: "merchant@example.com".into(),
        amount,
        realized_amount: realized,
        status: ItemStatus::from_code(status),
        created_at: None,
        completed_at: None,
    }
}

/// Credentials whose merchant id is `merchant`, used as the routing key
/// by [`ScriptedGateway`](super::gateway::ScriptedGateway).
pub fn credentials(merchant: &str) -> MerchantCredentials {
    MerchantCredentials::new("pay.example.com", merchant, "0123456789abcdef")
}
