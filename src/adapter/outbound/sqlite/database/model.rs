//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{merchant_credentials, notified_items, subscriptions};

/// Database row for a delivered notification.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = notified_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NotifiedItemRow {
    pub kind: String,
    pub item_id: String,
    pub subscriber_id: i64,
    pub notified_at: String,
}

/// Database row for a subscriber's gateway credentials.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = merchant_credentials)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CredentialsRow {
    pub subscriber_id: i64,
    pub domain: String,
    pub merchant_id: String,
    pub merchant_key: String,
    pub updated_at: String,
}

/// Database row for a subscriber's notification state.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = subscriptions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SubscriptionRow {
    pub subscriber_id: i64,
    pub active: i32,
    pub last_poll_at: Option<String>,
}
