//! Row and query models for the `legislation` table.

use legis_core::legislation::{LegislationItem, StoredLegislation};
use legis_core::source::Source;
use legis_core::types::{Date, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::error::StoreError;

/// Default page size for listings.
pub const DEFAULT_LIST_LIMIT: i64 = 500;

/// Upper bound on any single listing.
pub const MAX_LIST_LIMIT: i64 = 2000;

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// A `legislation` row exactly as PostgreSQL returns it.
#[derive(Debug, Clone, FromRow)]
pub struct LegislationRow {
    pub source: String,
    pub id: String,
    pub title: String,
    pub committee: String,
    pub proposer: Option<String>,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub content: String,
    pub link_url: Option<String>,
    pub bill_no: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<LegislationRow> for StoredLegislation {
    type Error = StoreError;

    fn try_from(row: LegislationRow) -> Result<Self, Self::Error> {
        let source: Source = row.source.parse().map_err(|e| StoreError::Corrupt {
            id: row.id.clone(),
            reason: format!("{e}"),
        })?;

        Ok(StoredLegislation {
            item: LegislationItem {
                id: row.id,
                title: row.title,
                committee: row.committee,
                proposer: row.proposer,
                start_date: row.start_date,
                end_date: row.end_date,
                content: row.content,
                link_url: row.link_url,
                bill_no: row.bill_no,
                source,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_active: row.is_active,
        })
    }
}

/// Map a batch of rows, failing on the first corrupt one.
pub fn into_stored(rows: Vec<LegislationRow>) -> Result<Vec<StoredLegislation>, StoreError> {
    rows.into_iter().map(StoredLegislation::try_from).collect()
}

// ---------------------------------------------------------------------------
// Query models
// ---------------------------------------------------------------------------

/// Filter for listing notices.
///
/// Results are always ordered by `start_date` descending, then `id`
/// ascending, so pagination is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub source: Option<Source>,
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListFilter {
    /// Active notices of one source.
    pub fn for_source(source: Source) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    /// Effective limit, clamped to `1..=MAX_LIST_LIMIT`.
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }

    /// Effective offset, never negative.
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Active-notice counts, plus how many rows are inactive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct LegislationStatistics {
    pub total: i64,
    pub national: i64,
    pub admin: i64,
    pub inactive: i64,
}
