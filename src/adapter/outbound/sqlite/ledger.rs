//! SQLite ledger implementation.
//!
//! Timestamps are stored as RFC 3339 text in UTC with second precision, so
//! lexical order matches chronological order and range filters can compare
//! strings.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::upsert::excluded;

use super::database::connection::DbPool;
use super::database::model::{CredentialsRow, NotifiedItemRow, SubscriptionRow};
use super::database::schema::{merchant_credentials, notified_items, subscriptions};
use crate::domain::id::SubscriberId;
use crate::domain::item::ItemKey;
use crate::domain::subscriber::{MerchantCredentials, Subscriber};
use crate::error::LedgerError;
use crate::port::outbound::ledger::Ledger;

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-backed notification ledger and subscriber registry.
pub struct SqliteLedger {
    pool: DbPool,
}

impl SqliteLedger {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<Conn, LedgerError> {
        self.pool
            .get()
            .map_err(|e| LedgerError::Connection(e.to_string()))
    }

    /// Every known subscriber with its state, ordered by id.
    pub fn list_subscribers(&self) -> Result<Vec<Subscriber>, LedgerError> {
        let mut conn = self.conn()?;

        let rows: Vec<(SubscriptionRow, Option<CredentialsRow>)> = subscriptions::table
            .left_join(
                merchant_credentials::table
                    .on(merchant_credentials::subscriber_id.eq(subscriptions::subscriber_id)),
            )
            .select((
                SubscriptionRow::as_select(),
                Option::<CredentialsRow>::as_select(),
            ))
            .order(subscriptions::subscriber_id.asc())
            .load(&mut conn)
            .map_err(query_error)?;

        rows.into_iter()
            .map(|(subscription, credentials)| to_subscriber(subscription, credentials))
            .collect()
    }
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn is_notified(
        &self,
        subscriber: SubscriberId,
        item: &ItemKey,
    ) -> Result<bool, LedgerError> {
        let mut conn = self.conn()?;

        let count: i64 = notified_items::table
            .filter(notified_items::kind.eq(item.kind.as_str()))
            .filter(notified_items::item_id.eq(item.id.as_str()))
            .filter(notified_items::subscriber_id.eq(subscriber.get()))
            .count()
            .get_result(&mut conn)
            .map_err(query_error)?;

        Ok(count > 0)
    }

    async fn mark_notified(
        &self,
        subscriber: SubscriberId,
        item: &ItemKey,
    ) -> Result<(), LedgerError> {
        let mut conn = self.conn()?;

        let row = NotifiedItemRow {
            kind: item.kind.as_str().to_string(),
            item_id: item.id.as_str().to_string(),
            subscriber_id: subscriber.get(),
            notified_at: timestamp(Utc::now()),
        };
        diesel::insert_or_ignore_into(notified_items::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(query_error)?;

        Ok(())
    }

    async fn active_subscribers(&self) -> Result<Vec<SubscriberId>, LedgerError> {
        let mut conn = self.conn()?;

        let ids: Vec<i64> = subscriptions::table
            .filter(subscriptions::active.eq(1))
            .select(subscriptions::subscriber_id)
            .order(subscriptions::subscriber_id.asc())
            .load(&mut conn)
            .map_err(query_error)?;

        Ok(ids.into_iter().map(SubscriberId::new).collect())
    }

    async fn update_last_poll(&self, subscriber: SubscriberId) -> Result<(), LedgerError> {
        let mut conn = self.conn()?;

        let row = SubscriptionRow {
            subscriber_id: subscriber.get(),
            active: 0,
            last_poll_at: Some(timestamp(Utc::now())),
        };
        diesel::insert_into(subscriptions::table)
            .values(&row)
            .on_conflict(subscriptions::subscriber_id)
            .do_update()
            .set(subscriptions::last_poll_at.eq(excluded(subscriptions::last_poll_at)))
            .execute(&mut conn)
            .map_err(query_error)?;

        Ok(())
    }

    async fn set_active(&self, subscriber: SubscriberId, active: bool) -> Result<(), LedgerError> {
        let mut conn = self.conn()?;

        let row = SubscriptionRow {
            subscriber_id: subscriber.get(),
            active: i32::from(active),
            last_poll_at: None,
        };
        diesel::insert_into(subscriptions::table)
            .values(&row)
            .on_conflict(subscriptions::subscriber_id)
            .do_update()
            .set(subscriptions::active.eq(excluded(subscriptions::active)))
            .execute(&mut conn)
            .map_err(query_error)?;

        Ok(())
    }

    async fn credentials(
        &self,
        subscriber: SubscriberId,
    ) -> Result<Option<MerchantCredentials>, LedgerError> {
        let mut conn = self.conn()?;

        let row: Option<CredentialsRow> = merchant_credentials::table
            .find(subscriber.get())
            .select(CredentialsRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(query_error)?;

        Ok(row.map(to_credentials))
    }

    async fn save_credentials(
        &self,
        subscriber: SubscriberId,
        credentials: &MerchantCredentials,
    ) -> Result<(), LedgerError> {
        let mut conn = self.conn()?;

        let row = CredentialsRow {
            subscriber_id: subscriber.get(),
            domain: credentials.domain.clone(),
            merchant_id: credentials.merchant_id.clone(),
            merchant_key: credentials.merchant_key.clone(),
            updated_at: timestamp(Utc::now()),
        };
        diesel::insert_into(merchant_credentials::table)
            .values(&row)
            .on_conflict(merchant_credentials::subscriber_id)
            .do_update()
            .set((
                merchant_credentials::domain.eq(excluded(merchant_credentials::domain)),
                merchant_credentials::merchant_id.eq(excluded(merchant_credentials::merchant_id)),
                merchant_credentials::merchant_key.eq(excluded(merchant_credentials::merchant_key)),
                merchant_credentials::updated_at.eq(excluded(merchant_credentials::updated_at)),
            ))
            .execute(&mut conn)
            .map_err(query_error)?;

        Ok(())
    }

    async fn subscriber(
        &self,
        subscriber: SubscriberId,
    ) -> Result<Option<Subscriber>, LedgerError> {
        let mut conn = self.conn()?;

        let subscription: Option<SubscriptionRow> = subscriptions::table
            .find(subscriber.get())
            .select(SubscriptionRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(query_error)?;
        let credentials: Option<CredentialsRow> = merchant_credentials::table
            .find(subscriber.get())
            .select(CredentialsRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(query_error)?;

        match (subscription, credentials) {
            (None, None) => Ok(None),
            (Some(subscription), credentials) => to_subscriber(subscription, credentials).map(Some),
            (None, Some(credentials)) => Ok(Some(Subscriber {
                id: subscriber,
                credentials: Some(to_credentials(credentials)),
                active: false,
                last_poll_at: None,
            })),
        }
    }

    async fn prune_notifications(&self, cutoff: DateTime<Utc>) -> Result<usize, LedgerError> {
        let mut conn = self.conn()?;

        let expired = notified_items::table.filter(notified_items::notified_at.lt(timestamp(cutoff)));
        let removed = diesel::delete(expired)
            .execute(&mut conn)
            .map_err(query_error)?;

        Ok(removed)
    }
}

fn query_error(e: diesel::result::Error) -> LedgerError {
    LedgerError::Query(e.to_string())
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| LedgerError::Corrupt(format!("bad timestamp {raw:?}: {e}")))
}

fn to_credentials(row: CredentialsRow) -> MerchantCredentials {
    MerchantCredentials::new(row.domain, row.merchant_id, row.merchant_key)
}

fn to_subscriber(
    subscription: SubscriptionRow,
    credentials: Option<CredentialsRow>,
) -> Result<Subscriber, LedgerError> {
    Ok(Subscriber {
        id: SubscriberId::new(subscription.subscriber_id),
        credentials: credentials.map(to_credentials),
        active: subscription.active != 0,
        last_poll_at: subscription
            .last_poll_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
    use crate::domain::item::ItemKind;

    const SUB: SubscriberId = SubscriberId::new(100);

    fn ledger() -> SqliteLedger {
        let pool = create_pool(":memory:", 1).unwrap();
        run_migrations(&pool).unwrap();
        SqliteLedger::new(pool)
    }

    fn key(id: &str) -> ItemKey {
        ItemKey::new(ItemKind::Order, id)
    }

    #[tokio::test]
    async fn mark_then_lookup() {
        let ledger = ledger();
        assert!(!ledger.is_notified(SUB, &key("T1")).await.unwrap());

        ledger.mark_notified(SUB, &key("T1")).await.unwrap();

        assert!(ledger.is_notified(SUB, &key("T1")).await.unwrap());
        assert!(!ledger.is_notified(SubscriberId::new(101), &key("T1")).await.unwrap());
    }

    #[tokio::test]
    async fn mark_twice_is_not_an_error() {
        let ledger = ledger();
        ledger.mark_notified(SUB, &key("T1")).await.unwrap();
        ledger.mark_notified(SUB, &key("T1")).await.unwrap();
    }

    #[tokio::test]
    async fn kinds_do_not_collide() {
        let ledger = ledger();
        ledger.mark_notified(SUB, &key("42")).await.unwrap();
        let settlement = ItemKey::new(ItemKind::Settlement, "42");
        assert!(!ledger.is_notified(SUB, &settlement).await.unwrap());
    }

    #[tokio::test]
    async fn active_flag_round_trips() {
        let ledger = ledger();
        ledger.set_active(SUB, true).await.unwrap();
        ledger.set_active(SubscriberId::new(5), true).await.unwrap();
        assert_eq!(
            ledger.active_subscribers().await.unwrap(),
            vec![SubscriberId::new(5), SUB]
        );

        ledger.set_active(SUB, false).await.unwrap();
        assert_eq!(
            ledger.active_subscribers().await.unwrap(),
            vec![SubscriberId::new(5)]
        );
    }

    #[tokio::test]
    async fn update_last_poll_keeps_active_flag() {
        let ledger = ledger();
        ledger.set_active(SUB, true).await.unwrap();
        ledger.update_last_poll(SUB).await.unwrap();

        let sub = ledger.subscriber(SUB).await.unwrap().unwrap();
        assert!(sub.active);
        assert!(sub.last_poll_at.is_some());
    }

    #[tokio::test]
    async fn credentials_upsert_replaces_previous() {
        let ledger = ledger();
        ledger
            .save_credentials(SUB, &MerchantCredentials::new("a.com", "1", "k1"))
            .await
            .unwrap();
        ledger
            .save_credentials(SUB, &MerchantCredentials::new("b.com", "2", "k2"))
            .await
            .unwrap();

        let creds = ledger.credentials(SUB).await.unwrap().unwrap();
        assert_eq!(creds, MerchantCredentials::new("b.com", "2", "k2"));
    }

    #[tokio::test]
    async fn unknown_subscriber_is_none() {
        let ledger = ledger();
        assert!(ledger.subscriber(SUB).await.unwrap().is_none());
        assert!(ledger.credentials(SUB).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn subscriber_with_only_credentials_is_inactive() {
        let ledger = ledger();
        ledger
            .save_credentials(SUB, &MerchantCredentials::new("a.com", "1", "k1"))
            .await
            .unwrap();

        let sub = ledger.subscriber(SUB).await.unwrap().unwrap();
        assert!(!sub.active);
        assert!(sub.credentials.is_some());
    }

    #[tokio::test]
    async fn prune_removes_records_before_cutoff() {
        let ledger = ledger();
        ledger.mark_notified(SUB, &key("T1")).await.unwrap();

        let past = Utc::now() - chrono::Duration::days(1);
        assert_eq!(ledger.prune_notifications(past).await.unwrap(), 0);

        let future = Utc::now() + chrono::Duration::days(1);
        assert_eq!(ledger.prune_notifications(future).await.unwrap(), 1);
        assert!(!ledger.is_notified(SUB, &key("T1")).await.unwrap());
    }

    #[tokio::test]
    async fn list_subscribers_joins_credentials() {
        let ledger = ledger();
        ledger.set_active(SUB, true).await.unwrap();
        ledger
            .save_credentials(SUB, &MerchantCredentials::new("a.com", "1", "k1"))
            .await
            .unwrap();
        ledger.set_active(SubscriberId::new(7), false).await.unwrap();

        let subs = ledger.list_subscribers().unwrap();
        assert_eq!(subs.len(), 2);
        assert!(subs[0].credentials.is_none());
        assert!(subs[1].is_pollable());
    }
}
