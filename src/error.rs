use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures talking to the payment gateway.
///
/// Every variant is transient from the poller's point of view: the cycle
/// counts as failed and the fetch is retried on the next tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("gateway request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("gateway rejected request: {0}")]
    Api(String),

    #[error("malformed gateway response: {0}")]
    Decode(String),
}

/// Ledger (persistence) failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger connection error: {0}")]
    Connection(String),

    #[error("ledger query failed: {0}")]
    Query(String),

    #[error("corrupt ledger row: {0}")]
    Corrupt(String),
}

/// Outcome of a failed delivery attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The recipient can no longer be reached (blocked the bot, chat gone).
    /// Permanent for the subscriber.
    #[error("recipient unreachable: {0}")]
    RecipientUnreachable(String),

    /// Anything else; the item is retried on the next cycle.
    #[error("transient delivery failure: {0}")]
    Transient(String),
}

impl DeliveryError {
    /// Whether this error should deactivate the subscriber.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::RecipientUnreachable(_))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
