//! Gateway-agnostic domain types.
//!
//! - [`id`] - Subscriber and item identifiers
//! - [`item`] - Orders, settlements and their status classification
//! - [`subscriber`] - Subscriber state and merchant credentials

pub mod id;
pub mod item;
pub mod subscriber;
