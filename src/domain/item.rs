//! Items observed on the payment gateway.
//!
//! A poll cycle fetches two independent collections, orders and
//! settlements. Both are normalized into [`RemoteItem`] so the change
//! detector and the notification gate can treat them uniformly.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use super::id::ItemId;

/// Raw gateway status code meaning "paid" / "settled".
pub const SUCCESS_CODE: &str = "1";

/// Status of a remote item, classified into success or anything else.
///
/// The raw gateway code is kept for `Other` so that a change between two
/// non-success codes still alters the result-set signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemStatus {
    Success,
    Other(String),
}

impl ItemStatus {
    /// Classify a raw gateway status code.
    pub fn from_code(code: impl Into<String>) -> Self {
        let code = code.into();
        if code.trim() == SUCCESS_CODE {
            Self::Success
        } else {
            Self::Other(code)
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The raw code as reported by the gateway.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Success => SUCCESS_CODE,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The two collections a subscriber is polled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Order,
    Settlement,
}

impl ItemKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Settlement => "settlement",
        }
    }

    /// Parse the persisted representation produced by [`ItemKind::as_str`].
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "order" => Some(Self::Order),
            "settlement" => Some(Self::Settlement),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger key of an item: ids are only unique within one collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub kind: ItemKind,
    pub id: ItemId,
}

impl ItemKey {
    pub fn new(kind: ItemKind, id: impl Into<ItemId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A merchant order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Gateway trade number.
    pub trade_no: ItemId,
    /// Merchant-side order number.
    pub out_trade_no: String,
    /// Payment channel (alipay, wxpay, ...).
    pub pay_type: String,
    /// Product name.
    pub name: String,
    pub amount: Decimal,
    pub status: ItemStatus,
    pub created_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

/// A payout settlement to the merchant.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub id: ItemId,
    /// Payout account.
    pub account: String,
    /// Requested amount.
    pub amount: Decimal,
    /// Amount actually paid out after fees.
    pub realized_amount: Decimal,
    pub status: ItemStatus,
    pub created_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

/// An order or settlement fetched during one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteItem {
    Order(Order),
    Settlement(Settlement),
}

impl RemoteItem {
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Order(_) => ItemKind::Order,
            Self::Settlement(_) => ItemKind::Settlement,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        match self {
            Self::Order(o) => &o.trade_no,
            Self::Settlement(s) => &s.id,
        }
    }

    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.kind(), self.id().clone())
    }

    #[must_use]
    pub fn status(&self) -> &ItemStatus {
        match self {
            Self::Order(o) => &o.status,
            Self::Settlement(s) => &s.status,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    #[must_use]
    pub fn amount(&self) -> Decimal {
        match self {
            Self::Order(o) => o.amount,
            Self::Settlement(s) => s.amount,
        }
    }

    /// Completion time, falling back to creation time.
    #[must_use]
    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Order(o) => o.completed_at.or(o.created_at),
            Self::Settlement(s) => s.completed_at.or(s.created_at),
        }
    }
}

impl From<Order> for RemoteItem {
    fn from(order: Order) -> Self {
        Self::Order(order)
    }
}

impl From<Settlement> for RemoteItem {
    fn from(settlement: Settlement) -> Self {
        Self::Settlement(settlement)
    }
}
