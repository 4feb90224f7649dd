//! Repository for the `legislation` table.

use legis_core::legislation::{LegislationItem, StoredLegislation};
use legis_core::reconcile::{decide, Liveness, ReconcileDecision};
use legis_core::source::Source;
use legis_core::types::{Date, Timestamp};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::legislation::{into_stored, LegislationRow, LegislationStatistics, ListFilter, MAX_LIST_LIMIT};

/// Column list for `legislation` queries.
const COLUMNS: &str = "\
    source, id, title, committee, proposer, start_date, end_date, \
    content, link_url, bill_no, is_active, created_at, updated_at";

/// Listing order shared by every query that returns notices.
const ORDER: &str = "ORDER BY start_date DESC, id ASC";

/// Provides query operations for legislative notices.
pub struct LegislationRepo;

impl LegislationRepo {
    /// Find a notice by its `(source, id)` key, active or not.
    pub async fn find(
        pool: &PgPool,
        source: Source,
        id: &str,
    ) -> Result<Option<StoredLegislation>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM legislation WHERE source = $1 AND id = $2");
        sqlx::query_as::<_, LegislationRow>(&query)
            .bind(source.as_str())
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(StoredLegislation::try_from)
            .transpose()
    }

    /// Insert, update or leave alone the row for `candidate`, atomically.
    ///
    /// The existing row is locked with `FOR UPDATE` so concurrent updates of
    /// the same key serialize. Two concurrent inserts race on the primary
    /// key; the loser gets [`StoreError::Conflict`] and writes nothing.
    pub async fn reconcile(
        pool: &PgPool,
        candidate: &LegislationItem,
        liveness: &Liveness,
        now: Timestamp,
    ) -> Result<ReconcileDecision, StoreError> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {COLUMNS} FROM legislation WHERE source = $1 AND id = $2 FOR UPDATE"
        );
        let existing = sqlx::query_as::<_, LegislationRow>(&query)
            .bind(candidate.source.as_str())
            .bind(&candidate.id)
            .fetch_optional(&mut *tx)
            .await?
            .map(StoredLegislation::try_from)
            .transpose()?;

        let decision = decide(existing.as_ref(), candidate, liveness);

        match &decision {
            ReconcileDecision::Insert => {
                let result = sqlx::query(
                    "INSERT INTO legislation \
                     (source, id, title, committee, proposer, start_date, end_date, \
                      content, link_url, bill_no, is_active, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) \
                     ON CONFLICT (source, id) DO NOTHING",
                )
                .bind(candidate.source.as_str())
                .bind(&candidate.id)
                .bind(&candidate.title)
                .bind(&candidate.committee)
                .bind(&candidate.proposer)
                .bind(candidate.start_date)
                .bind(candidate.end_date)
                .bind(&candidate.content)
                .bind(&candidate.link_url)
                .bind(&candidate.bill_no)
                .bind(liveness.is_open(candidate))
                .bind(now)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    tx.rollback().await?;
                    return Err(StoreError::Conflict {
                        source: candidate.source,
                        id: candidate.id.clone(),
                    });
                }
            }
            ReconcileDecision::Update { .. } => {
                sqlx::query(
                    "UPDATE legislation \
                     SET title = $3, committee = $4, proposer = $5, start_date = $6, \
                         end_date = $7, content = $8, link_url = $9, bill_no = $10, \
                         is_active = is_active OR $11, updated_at = $12 \
                     WHERE source = $1 AND id = $2",
                )
                .bind(candidate.source.as_str())
                .bind(&candidate.id)
                .bind(&candidate.title)
                .bind(&candidate.committee)
                .bind(&candidate.proposer)
                .bind(candidate.start_date)
                .bind(candidate.end_date)
                .bind(&candidate.content)
                .bind(&candidate.link_url)
                .bind(&candidate.bill_no)
                .bind(decision.reactivates())
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
            ReconcileDecision::Unchanged => {}
        }

        tx.commit().await?;
        Ok(decision)
    }

    /// List notices matching `filter`.
    pub async fn list(
        pool: &PgPool,
        filter: &ListFilter,
    ) -> Result<Vec<StoredLegislation>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM legislation \
             WHERE ($1::TEXT IS NULL OR source = $1) AND ($2 OR is_active) \
             {ORDER} LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, LegislationRow>(&query)
            .bind(filter.source.map(Source::as_str))
            .bind(filter.include_inactive)
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(pool)
            .await?;
        into_stored(rows)
    }

    /// Number of notices matching `filter`, ignoring its limit and offset.
    pub async fn count(pool: &PgPool, filter: &ListFilter) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM legislation \
             WHERE ($1::TEXT IS NULL OR source = $1) AND ($2 OR is_active)",
        )
        .bind(filter.source.map(Source::as_str))
        .bind(filter.include_inactive)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Active notices whose title, committee or content contains `keyword`,
    /// case-insensitively.
    pub async fn search(
        pool: &PgPool,
        keyword: &str,
        source: Option<Source>,
    ) -> Result<Vec<StoredLegislation>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM legislation \
             WHERE is_active AND ($2::TEXT IS NULL OR source = $2) \
               AND (title ILIKE $1 ESCAPE '\\' OR committee ILIKE $1 ESCAPE '\\' \
                    OR content ILIKE $1 ESCAPE '\\') \
             {ORDER} LIMIT $3"
        );
        let rows = sqlx::query_as::<_, LegislationRow>(&query)
            .bind(format!("%{}%", escape_like(keyword)))
            .bind(source.map(Source::as_str))
            .bind(MAX_LIST_LIMIT)
            .fetch_all(pool)
            .await?;
        into_stored(rows)
    }

    /// Active notices first stored at or after `since`.
    pub async fn recent(
        pool: &PgPool,
        since: Timestamp,
    ) -> Result<Vec<StoredLegislation>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM legislation \
             WHERE is_active AND created_at >= $1 \
             {ORDER} LIMIT $2"
        );
        let rows = sqlx::query_as::<_, LegislationRow>(&query)
            .bind(since)
            .bind(MAX_LIST_LIMIT)
            .fetch_all(pool)
            .await?;
        into_stored(rows)
    }

    /// Active-notice counts per source.
    pub async fn statistics(pool: &PgPool) -> Result<LegislationStatistics, StoreError> {
        let stats = sqlx::query_as::<_, LegislationStatistics>(
            "SELECT \
                 COUNT(*) FILTER (WHERE is_active) AS total, \
                 COUNT(*) FILTER (WHERE is_active AND source = 'national') AS national, \
                 COUNT(*) FILTER (WHERE is_active AND source = 'admin') AS admin, \
                 COUNT(*) FILTER (WHERE NOT is_active) AS inactive \
             FROM legislation",
        )
        .fetch_one(pool)
        .await?;
        Ok(stats)
    }

    /// Every row of `source` pointing at `link_url`, active or not.
    pub async fn find_by_link_url(
        pool: &PgPool,
        source: Source,
        link_url: &str,
    ) -> Result<Vec<StoredLegislation>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM legislation \
             WHERE source = $1 AND link_url = $2 {ORDER}"
        );
        let rows = sqlx::query_as::<_, LegislationRow>(&query)
            .bind(source.as_str())
            .bind(link_url)
            .fetch_all(pool)
            .await?;
        into_stored(rows)
    }

    /// Deactivate active rows of `source` posted on or after `since` whose
    /// id is not in `seen`. Returns the number of rows deactivated.
    pub async fn deactivate_unseen(
        pool: &PgPool,
        source: Source,
        since: Date,
        seen: &[String],
        now: Timestamp,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE legislation SET is_active = FALSE, updated_at = $4 \
             WHERE source = $1 AND is_active AND start_date >= $2 AND NOT (id = ANY($3))",
        )
        .bind(source.as_str())
        .bind(since)
        .bind(seen)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Deactivate active rows whose posting period closed before `today`.
    pub async fn deactivate_expired(
        pool: &PgPool,
        today: Date,
        now: Timestamp,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE legislation SET is_active = FALSE, updated_at = $2 \
             WHERE is_active AND end_date < $1",
        )
        .bind(today)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Deactivate active rows first stored before `cutoff`.
    pub async fn deactivate_created_before(
        pool: &PgPool,
        cutoff: Timestamp,
        now: Timestamp,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE legislation SET is_active = FALSE, updated_at = $2 \
             WHERE is_active AND created_at < $1",
        )
        .bind(cutoff)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Escape `LIKE` metacharacters so `keyword` matches literally.
pub fn escape_like(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
