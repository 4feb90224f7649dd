//! In-process store used by tests and when no database is configured.
//!
//! Semantics match [`PgLegislationStore`](crate::PgLegislationStore): same
//! ordering, same active filtering, same reconcile decisions. Reconcile
//! holds the write lock across read and write, so it is atomic per call.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use legis_core::legislation::{LegislationItem, StoredLegislation};
use legis_core::reconcile::{apply_update, decide, insert_row, Liveness, ReconcileDecision};
use legis_core::source::Source;
use legis_core::types::{Date, Timestamp};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::legislation::{LegislationStatistics, ListFilter, MAX_LIST_LIMIT};
use crate::store::LegislationStore;

type Key = (Source, String);

#[derive(Debug, Default)]
pub struct MemoryLegislationStore {
    rows: RwLock<BTreeMap<Key, StoredLegislation>>,
}

impl MemoryLegislationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows held, active or not.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Collect rows matching `keep`, in listing order.
    async fn select(&self, keep: impl Fn(&StoredLegislation) -> bool) -> Vec<StoredLegislation> {
        let rows = self.rows.read().await;
        let mut out: Vec<StoredLegislation> = rows.values().filter(|r| keep(r)).cloned().collect();
        sort_for_listing(&mut out);
        out
    }

    async fn deactivate_where(
        &self,
        now: Timestamp,
        matches: impl Fn(&StoredLegislation) -> bool,
    ) -> u64 {
        let mut rows = self.rows.write().await;
        let mut count = 0;
        for row in rows.values_mut().filter(|r| r.is_active && matches(r)) {
            row.is_active = false;
            row.updated_at = now;
            count += 1;
        }
        count
    }
}

fn sort_for_listing(rows: &mut [StoredLegislation]) {
    rows.sort_by(|a, b| {
        b.item
            .start_date
            .cmp(&a.item.start_date)
            .then_with(|| a.item.id.cmp(&b.item.id))
    });
}

fn filter_admits(filter: &ListFilter, row: &StoredLegislation) -> bool {
    filter.source.map_or(true, |s| row.item.source == s) && (filter.include_inactive || row.is_active)
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

#[async_trait]
impl LegislationStore for MemoryLegislationStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find(&self, source: Source, id: &str) -> Result<Option<StoredLegislation>, StoreError> {
        Ok(self.rows.read().await.get(&(source, id.to_string())).cloned())
    }

    async fn reconcile(
        &self,
        candidate: &LegislationItem,
        liveness: &Liveness,
        now: Timestamp,
    ) -> Result<ReconcileDecision, StoreError> {
        let mut rows = self.rows.write().await;
        let key = (candidate.source, candidate.id.clone());
        let decision = decide(rows.get(&key), candidate, liveness);

        match &decision {
            ReconcileDecision::Insert => {
                rows.insert(key, insert_row(candidate, liveness, now));
            }
            ReconcileDecision::Update { .. } => {
                if let Some(row) = rows.get_mut(&key) {
                    apply_update(row, candidate, decision.reactivates(), now);
                }
            }
            ReconcileDecision::Unchanged => {}
        }

        Ok(decision)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<StoredLegislation>, StoreError> {
        let rows = self.select(|r| filter_admits(filter, r)).await;

        Ok(rows
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect())
    }

    async fn count(&self, filter: &ListFilter) -> Result<i64, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|r| filter_admits(filter, r)).count() as i64)
    }

    async fn search(
        &self,
        keyword: &str,
        source: Option<Source>,
    ) -> Result<Vec<StoredLegislation>, StoreError> {
        let needle = keyword.to_lowercase();
        let mut rows = self
            .select(|r| {
                r.is_active
                    && source.map_or(true, |s| r.item.source == s)
                    && (contains_ignore_case(&r.item.title, &needle)
                        || contains_ignore_case(&r.item.committee, &needle)
                        || contains_ignore_case(&r.item.content, &needle))
            })
            .await;
        rows.truncate(MAX_LIST_LIMIT as usize);
        Ok(rows)
    }

    async fn recent(&self, since: Timestamp) -> Result<Vec<StoredLegislation>, StoreError> {
        let mut rows = self.select(|r| r.is_active && r.created_at >= since).await;
        rows.truncate(MAX_LIST_LIMIT as usize);
        Ok(rows)
    }

    async fn statistics(&self) -> Result<LegislationStatistics, StoreError> {
        let rows = self.rows.read().await;
        let mut stats = LegislationStatistics::default();
        for row in rows.values() {
            if !row.is_active {
                stats.inactive += 1;
                continue;
            }
            stats.total += 1;
            match row.item.source {
                Source::National => stats.national += 1,
                Source::Admin => stats.admin += 1,
            }
        }
        Ok(stats)
    }

    async fn find_by_link_url(
        &self,
        source: Source,
        link_url: &str,
    ) -> Result<Vec<StoredLegislation>, StoreError> {
        Ok(self
            .select(|r| r.item.source == source && r.item.link_url.as_deref() == Some(link_url))
            .await)
    }

    async fn deactivate_unseen(
        &self,
        source: Source,
        since: Date,
        seen: &[String],
        now: Timestamp,
    ) -> Result<u64, StoreError> {
        let seen: HashSet<&str> = seen.iter().map(String::as_str).collect();
        Ok(self
            .deactivate_where(now, |r| {
                r.item.source == source
                    && r.item.start_date >= since
                    && !seen.contains(r.item.id.as_str())
            })
            .await)
    }

    async fn deactivate_expired(&self, today: Date, now: Timestamp) -> Result<u64, StoreError> {
        Ok(self
            .deactivate_where(now, |r| r.item.end_date.is_some_and(|end| end < today))
            .await)
    }

    async fn deactivate_created_before(
        &self,
        cutoff: Timestamp,
        now: Timestamp,
    ) -> Result<u64, StoreError> {
        Ok(self.deactivate_where(now, |r| r.created_at < cutoff).await)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn live() -> Liveness {
        Liveness::new(d(2024, 1, 1))
    }

    fn item(source: Source, id: &str, start: Date) -> LegislationItem {
        LegislationItem {
            id: id.into(),
            title: format!("Act {id}"),
            committee: "Legislation and Judiciary".into(),
            proposer: None,
            start_date: start,
            end_date: None,
            content: String::new(),
            link_url: None,
            bill_no: None,
            source,
        }
    }

    #[tokio::test]
    async fn reconcile_inserts_then_leaves_unchanged() {
        let store = MemoryLegislationStore::new();
        let a = item(Source::National, "a", d(2024, 1, 1));

        assert_eq!(store.reconcile(&a, &live(), t0()).await.unwrap(), ReconcileDecision::Insert);
        assert_eq!(
            store.reconcile(&a, &live(), t0() + Duration::hours(1)).await.unwrap(),
            ReconcileDecision::Unchanged
        );

        let row = store.find(Source::National, "a").await.unwrap().unwrap();
        assert_eq!(row.updated_at, t0());
    }

    #[tokio::test]
    async fn update_keeps_created_at() {
        let store = MemoryLegislationStore::new();
        let a = item(Source::National, "a", d(2024, 1, 1));
        store.reconcile(&a, &live(), t0()).await.unwrap();

        let later = t0() + Duration::hours(2);
        let changed = LegislationItem {
            content: "new summary".into(),
            ..a
        };
        assert_matches!(
            store.reconcile(&changed, &live(), later).await.unwrap(),
            ReconcileDecision::Update { .. }
        );

        let row = store.find(Source::National, "a").await.unwrap().unwrap();
        assert_eq!(row.created_at, t0());
        assert_eq!(row.updated_at, later);
        assert_eq!(row.item.content, "new summary");
    }

    #[tokio::test]
    async fn list_orders_by_start_date_then_id() {
        let store = MemoryLegislationStore::new();
        for (id, day) in [("b", 2), ("a", 2), ("c", 3), ("d", 1)] {
            store
                .reconcile(&item(Source::Admin, id, d(2024, 1, day)), &live(), t0())
                .await
                .unwrap();
        }

        let ids: Vec<String> = store
            .list(&ListFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.item.id)
            .collect();
        assert_eq!(ids, ["c", "a", "b", "d"]);

        let page = store
            .list(&ListFilter {
                limit: Some(2),
                offset: Some(1),
                ..ListFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].item.id, "a");
        assert_eq!(store.count(&ListFilter::default()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn deactivate_unseen_only_touches_window_of_one_source() {
        let store = MemoryLegislationStore::new();
        store.reconcile(&item(Source::National, "old", d(2023, 12, 1)), &live(), t0()).await.unwrap();
        store.reconcile(&item(Source::National, "seen", d(2024, 1, 1)), &live(), t0()).await.unwrap();
        store.reconcile(&item(Source::National, "gone", d(2024, 1, 1)), &live(), t0()).await.unwrap();
        store.reconcile(&item(Source::Admin, "other", d(2024, 1, 1)), &live(), t0()).await.unwrap();

        let n = store
            .deactivate_unseen(Source::National, d(2024, 1, 1), &["seen".to_string()], t0())
            .await
            .unwrap();
        assert_eq!(n, 1);

        let active: Vec<String> = store
            .list(&ListFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.item.id)
            .collect();
        assert_eq!(active, ["other", "seen", "old"]);

        let all = store
            .list(&ListFilter {
                include_inactive: true,
                ..ListFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn reconcile_reactivates_withdrawn_row() {
        let store = MemoryLegislationStore::new();
        let a = item(Source::National, "a", d(2024, 1, 1));
        store.reconcile(&a, &live(), t0()).await.unwrap();
        store.deactivate_unseen(Source::National, d(2024, 1, 1), &[], t0()).await.unwrap();

        assert_matches!(
            store.reconcile(&a, &live(), t0()).await.unwrap(),
            ReconcileDecision::Update { .. }
        );
        assert!(store.find(Source::National, "a").await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn retired_rows_are_not_reactivated() {
        let store = MemoryLegislationStore::new();
        let a = item(Source::National, "a", d(2024, 1, 1));
        store.reconcile(&a, &live(), t0()).await.unwrap();
        let cutoff = t0() + Duration::days(30);
        store.deactivate_created_before(cutoff, cutoff).await.unwrap();

        let retained = Liveness::new(d(2024, 2, 1)).with_retained_since(cutoff);
        assert_eq!(
            store.reconcile(&a, &retained, cutoff).await.unwrap(),
            ReconcileDecision::Unchanged
        );

        let mut closed = item(Source::National, "b", d(2024, 1, 1));
        closed.end_date = Some(d(2024, 1, 10));
        assert_eq!(
            store.reconcile(&closed, &retained, cutoff).await.unwrap(),
            ReconcileDecision::Insert
        );

        assert!(!store.find(Source::National, "a").await.unwrap().unwrap().is_active);
        assert!(!store.find(Source::National, "b").await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn expired_and_retention_deactivation() {
        let store = MemoryLegislationStore::new();
        let mut closed = item(Source::Admin, "closed", d(2024, 1, 1));
        closed.end_date = Some(d(2024, 1, 5));
        let open = item(Source::Admin, "open", d(2024, 1, 1));
        store.reconcile(&closed, &live(), t0()).await.unwrap();
        store.reconcile(&open, &live(), t0() + Duration::days(40)).await.unwrap();

        assert_eq!(store.deactivate_expired(d(2024, 1, 6), t0()).await.unwrap(), 1);
        assert_eq!(
            store
                .deactivate_created_before(t0() + Duration::days(10), t0())
                .await
                .unwrap(),
            0
        );

        let stats = store.statistics().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.admin, 1);
        assert_eq!(stats.inactive, 1);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_active_only() {
        let store = MemoryLegislationStore::new();
        let mut a = item(Source::National, "a", d(2024, 1, 1));
        a.title = "Road Traffic Act".into();
        let mut b = item(Source::Admin, "b", d(2024, 1, 2));
        b.content = "amends the road traffic rules".into();
        store.reconcile(&a, &live(), t0()).await.unwrap();
        store.reconcile(&b, &live(), t0()).await.unwrap();

        assert_eq!(store.search("ROAD", None).await.unwrap().len(), 2);
        assert_eq!(
            store.search("road", Some(Source::National)).await.unwrap().len(),
            1
        );

        store.deactivate_unseen(Source::Admin, d(2024, 1, 1), &[], t0()).await.unwrap();
        assert_eq!(store.search("road", None).await.unwrap().len(), 1);
    }
}
