//! The persistence seam between the refresh pipeline, the API and storage.

use async_trait::async_trait;
use legis_core::legislation::{LegislationItem, StoredLegislation};
use legis_core::reconcile::{Liveness, ReconcileDecision};
use legis_core::source::Source;
use legis_core::types::{Date, Timestamp};

use crate::error::StoreError;
use crate::models::legislation::{LegislationStatistics, ListFilter};
use crate::repositories::LegislationRepo;
use crate::DbPool;

/// Storage for legislative notices keyed by `(source, id)`.
///
/// Rows are never deleted. Withdrawal, closing and retention flip
/// `is_active`; a later reconcile of the same key reactivates the row when
/// its [`Liveness`] allows.
#[async_trait]
pub trait LegislationStore: Send + Sync {
    /// Fail if the backing storage cannot serve requests.
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn find(&self, source: Source, id: &str) -> Result<Option<StoredLegislation>, StoreError>;

    /// Atomically insert, update or leave alone the row for `candidate`.
    async fn reconcile(
        &self,
        candidate: &LegislationItem,
        liveness: &Liveness,
        now: Timestamp,
    ) -> Result<ReconcileDecision, StoreError>;

    async fn list(&self, filter: &ListFilter) -> Result<Vec<StoredLegislation>, StoreError>;

    /// Number of rows `list` would return without limit and offset.
    async fn count(&self, filter: &ListFilter) -> Result<i64, StoreError>;

    async fn search(
        &self,
        keyword: &str,
        source: Option<Source>,
    ) -> Result<Vec<StoredLegislation>, StoreError>;

    /// Active notices first stored at or after `since`.
    async fn recent(&self, since: Timestamp) -> Result<Vec<StoredLegislation>, StoreError>;

    async fn statistics(&self) -> Result<LegislationStatistics, StoreError>;

    async fn find_by_link_url(
        &self,
        source: Source,
        link_url: &str,
    ) -> Result<Vec<StoredLegislation>, StoreError>;

    /// Deactivate active rows of `source` posted on or after `since` that
    /// are not listed in `seen`.
    async fn deactivate_unseen(
        &self,
        source: Source,
        since: Date,
        seen: &[String],
        now: Timestamp,
    ) -> Result<u64, StoreError>;

    /// Deactivate active rows whose `end_date` is before `today`.
    async fn deactivate_expired(&self, today: Date, now: Timestamp) -> Result<u64, StoreError>;

    /// Deactivate active rows whose `created_at` is before `cutoff`.
    async fn deactivate_created_before(
        &self,
        cutoff: Timestamp,
        now: Timestamp,
    ) -> Result<u64, StoreError>;
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgLegislationStore {
    pool: DbPool,
}

impl PgLegislationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl LegislationStore for PgLegislationStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn find(&self, source: Source, id: &str) -> Result<Option<StoredLegislation>, StoreError> {
        LegislationRepo::find(&self.pool, source, id).await
    }

    async fn reconcile(
        &self,
        candidate: &LegislationItem,
        liveness: &Liveness,
        now: Timestamp,
    ) -> Result<ReconcileDecision, StoreError> {
        LegislationRepo::reconcile(&self.pool, candidate, liveness, now).await
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<StoredLegislation>, StoreError> {
        LegislationRepo::list(&self.pool, filter).await
    }

    async fn count(&self, filter: &ListFilter) -> Result<i64, StoreError> {
        LegislationRepo::count(&self.pool, filter).await
    }

    async fn search(
        &self,
        keyword: &str,
        source: Option<Source>,
    ) -> Result<Vec<StoredLegislation>, StoreError> {
        LegislationRepo::search(&self.pool, keyword, source).await
    }

    async fn recent(&self, since: Timestamp) -> Result<Vec<StoredLegislation>, StoreError> {
        LegislationRepo::recent(&self.pool, since).await
    }

    async fn statistics(&self) -> Result<LegislationStatistics, StoreError> {
        LegislationRepo::statistics(&self.pool).await
    }

    async fn find_by_link_url(
        &self,
        source: Source,
        link_url: &str,
    ) -> Result<Vec<StoredLegislation>, StoreError> {
        LegislationRepo::find_by_link_url(&self.pool, source, link_url).await
    }

    async fn deactivate_unseen(
        &self,
        source: Source,
        since: Date,
        seen: &[String],
        now: Timestamp,
    ) -> Result<u64, StoreError> {
        LegislationRepo::deactivate_unseen(&self.pool, source, since, seen, now).await
    }

    async fn deactivate_expired(&self, today: Date, now: Timestamp) -> Result<u64, StoreError> {
        LegislationRepo::deactivate_expired(&self.pool, today, now).await
    }

    async fn deactivate_created_before(
        &self,
        cutoff: Timestamp,
        now: Timestamp,
    ) -> Result<u64, StoreError> {
        LegislationRepo::deactivate_created_before(&self.pool, cutoff, now).await
    }
}
