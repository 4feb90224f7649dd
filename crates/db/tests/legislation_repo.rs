//! Integration tests for the PostgreSQL store.
//!
//! Exercises [`PgLegislationStore`] against a real database to verify that:
//! - Reconcile inserts, updates and no-ops exactly as the in-memory store does
//! - `created_at` survives updates and `updated_at` only moves on writes
//! - Deactivation is scoped and reversible
//! - Listing order is stable across sources
//!
//! Requires `DATABASE_URL`; run with `cargo test -- --ignored`.

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use legis_core::legislation::LegislationItem;
use legis_core::reconcile::{Liveness, ReconcileDecision};
use legis_core::source::Source;
use legis_core::types::{Date, Timestamp};
use legis_db::models::legislation::ListFilter;
use legis_db::{LegislationStore, PgLegislationStore};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd_opt(y, m, day).unwrap()
}

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

fn live() -> Liveness {
    Liveness::new(d(2024, 1, 1))
}

fn new_item(source: Source, id: &str, start: Date) -> LegislationItem {
    LegislationItem {
        id: id.to_string(),
        title: format!("Act {id}"),
        committee: "Legislation and Judiciary".to_string(),
        proposer: Some("Kim".to_string()),
        start_date: start,
        end_date: Some(start + Duration::days(10)),
        content: "summary".to_string(),
        link_url: Some(format!("https://example.test/{id}")),
        bill_no: Some(format!("B-{id}")),
        source,
    }
}

// ---------------------------------------------------------------------------
// Test: reconcile lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_reconcile_insert_update_unchanged(pool: PgPool) {
    let store = PgLegislationStore::new(pool);
    let item = new_item(Source::National, "a", d(2024, 1, 1));

    assert_eq!(
        store.reconcile(&item, &live(), t0()).await.unwrap(),
        ReconcileDecision::Insert
    );
    assert_eq!(
        store.reconcile(&item, &live(), t0() + Duration::hours(1)).await.unwrap(),
        ReconcileDecision::Unchanged
    );

    let later = t0() + Duration::hours(2);
    let changed = LegislationItem {
        end_date: Some(d(2024, 1, 20)),
        ..item.clone()
    };
    assert_eq!(
        store.reconcile(&changed, &live(), later).await.unwrap(),
        ReconcileDecision::Update {
            changed: vec!["end_date"]
        }
    );

    let row = store.find(Source::National, "a").await.unwrap().unwrap();
    assert_eq!(row.created_at, t0());
    assert_eq!(row.updated_at, later);
    assert_eq!(row.item.end_date, Some(d(2024, 1, 20)));
    assert!(row.is_active);
}

// ---------------------------------------------------------------------------
// Test: deactivation and reactivation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_deactivate_unseen_then_reactivate(pool: PgPool) {
    let store = PgLegislationStore::new(pool);
    let seen = new_item(Source::National, "seen", d(2024, 1, 1));
    let gone = new_item(Source::National, "gone", d(2024, 1, 1));
    let other = new_item(Source::Admin, "other", d(2024, 1, 1));
    for item in [&seen, &gone, &other] {
        store.reconcile(item, &live(), t0()).await.unwrap();
    }

    let n = store
        .deactivate_unseen(Source::National, d(2024, 1, 1), &["seen".to_string()], t0())
        .await
        .unwrap();
    assert_eq!(n, 1);

    let active = store.list(&ListFilter::default()).await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|r| r.item.id != "gone"));

    assert_matches!(
        store.reconcile(&gone, &live(), t0()).await.unwrap(),
        ReconcileDecision::Update { .. }
    );
    assert!(store.find(Source::National, "gone").await.unwrap().unwrap().is_active);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_retired_and_closed_rows_stay_inactive(pool: PgPool) {
    let store = PgLegislationStore::new(pool);
    let old = new_item(Source::Admin, "old", d(2024, 1, 1));
    store.reconcile(&old, &live(), t0()).await.unwrap();
    let cutoff = t0() + Duration::days(30);
    assert_eq!(store.deactivate_created_before(cutoff, cutoff).await.unwrap(), 1);

    let retained = Liveness::new(d(2024, 1, 5)).with_retained_since(cutoff);
    assert_eq!(
        store.reconcile(&old, &retained, cutoff).await.unwrap(),
        ReconcileDecision::Unchanged
    );

    // closes on 2024-01-11
    let closed = new_item(Source::Admin, "closed", d(2024, 1, 1));
    let after_close = Liveness::new(d(2024, 1, 12));
    assert_eq!(
        store.reconcile(&closed, &after_close, cutoff).await.unwrap(),
        ReconcileDecision::Insert
    );

    assert!(!store.find(Source::Admin, "old").await.unwrap().unwrap().is_active);
    assert!(!store.find(Source::Admin, "closed").await.unwrap().unwrap().is_active);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_deactivate_expired_and_statistics(pool: PgPool) {
    let store = PgLegislationStore::new(pool);
    store.reconcile(&new_item(Source::National, "a", d(2024, 1, 1)), &live(), t0()).await.unwrap();
    store.reconcile(&new_item(Source::Admin, "b", d(2024, 2, 1)), &live(), t0()).await.unwrap();

    // "a" closes on 2024-01-11.
    assert_eq!(store.deactivate_expired(d(2024, 1, 12), t0()).await.unwrap(), 1);

    let stats = store.statistics().await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.national, 0);
    assert_eq!(stats.admin, 1);
    assert_eq!(stats.inactive, 1);
}

// ---------------------------------------------------------------------------
// Test: queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_list_search_and_link_lookup(pool: PgPool) {
    let store = PgLegislationStore::new(pool);
    for (source, id, day) in [
        (Source::National, "b", 2),
        (Source::Admin, "a", 2),
        (Source::National, "c", 3),
    ] {
        store.reconcile(&new_item(source, id, d(2024, 1, day)), &live(), t0()).await.unwrap();
    }

    let ids: Vec<String> = store
        .list(&ListFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.item.id)
        .collect();
    assert_eq!(ids, ["c", "a", "b"]);

    let national = store.list(&ListFilter::for_source(Source::National)).await.unwrap();
    assert_eq!(national.len(), 2);

    assert_eq!(store.search("ACT C", None).await.unwrap().len(), 1);
    assert_eq!(store.search("100%", None).await.unwrap().len(), 0);

    let by_link = store
        .find_by_link_url(Source::Admin, "https://example.test/a")
        .await
        .unwrap();
    assert_eq!(by_link.len(), 1);
    assert_eq!(by_link[0].item.id, "a");
}
