//! SQLite ledger against a database file.

mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};
use epaywatch::adapter::outbound::sqlite::{create_pool, run_migrations, SqliteLedger};
use epaywatch::application::retention::{prune_once, RetentionPolicy};
use epaywatch::domain::id::SubscriberId;
use epaywatch::domain::item::{ItemKey, ItemKind};
use epaywatch::port::outbound::ledger::Ledger;
use epaywatch::testkit::domain::credentials;
use support::TempDb;

const SUB: SubscriberId = SubscriberId::new(-100_123);

fn order_key(id: &str) -> ItemKey {
    ItemKey::new(ItemKind::Order, id)
}

#[tokio::test]
async fn state_survives_reopening_the_file() {
    let db = TempDb::create();
    {
        let ledger = SqliteLedger::new(db.pool());
        ledger
            .save_credentials(SUB, &credentials("1000"))
            .await
            .unwrap();
        ledger.set_active(SUB, true).await.unwrap();
        ledger.mark_notified(SUB, &order_key("T1")).await.unwrap();
    }

    let pool = create_pool(&db.path().to_string_lossy(), 1).unwrap();
    run_migrations(&pool).unwrap();
    let reopened = SqliteLedger::new(pool);

    assert!(reopened.is_notified(SUB, &order_key("T1")).await.unwrap());
    assert!(!reopened.is_notified(SUB, &order_key("T2")).await.unwrap());
    assert_eq!(reopened.active_subscribers().await.unwrap(), vec![SUB]);
    assert_eq!(
        reopened.credentials(SUB).await.unwrap(),
        Some(credentials("1000"))
    );
}

#[tokio::test]
async fn concurrent_marks_share_one_connection() {
    let db = TempDb::create();
    let ledger = Arc::new(SqliteLedger::new(db.pool()));

    let mut tasks = Vec::new();
    for worker in 0..8_i64 {
        let ledger = Arc::clone(&ledger);
        tasks.push(tokio::spawn(async move {
            let subscriber = SubscriberId::new(worker);
            for i in 0..10 {
                let key = ItemKey::new(ItemKind::Settlement, format!("S{i}"));
                ledger.mark_notified(subscriber, &key).await.unwrap();
                ledger.mark_notified(subscriber, &key).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for worker in 0..8_i64 {
        let key = ItemKey::new(ItemKind::Settlement, "S9");
        assert!(ledger
            .is_notified(SubscriberId::new(worker), &key)
            .await
            .unwrap());
    }
}

#[tokio::test]
async fn prune_once_keeps_recent_records() {
    let db = TempDb::create();
    let ledger = SqliteLedger::new(db.pool());
    ledger.mark_notified(SUB, &order_key("T1")).await.unwrap();

    let policy = RetentionPolicy {
        keep_days: 1,
        ..RetentionPolicy::default()
    };
    assert_eq!(prune_once(&ledger, policy).await.unwrap(), 0);
    assert!(ledger.is_notified(SUB, &order_key("T1")).await.unwrap());

    // A cutoff in the future covers everything recorded so far.
    let removed = ledger
        .prune_notifications(Utc::now() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(!ledger.is_notified(SUB, &order_key("T1")).await.unwrap());
}

#[tokio::test]
async fn last_poll_does_not_activate_subscriber() {
    let db = TempDb::create();
    let ledger = SqliteLedger::new(db.pool());
    ledger.update_last_poll(SUB).await.unwrap();

    assert!(ledger.active_subscribers().await.unwrap().is_empty());
    let listed = ledger.list_subscribers().unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].last_poll_at.is_some());
    assert!(listed[0].credentials.is_none());
}
