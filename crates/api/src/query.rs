//! Query parameter types for the notice endpoints.

use legis_core::source::Source;
use legis_db::models::legislation::ListFilter;
use serde::Deserialize;

use crate::error::AppError;

/// Default look-back for `/recent`.
pub const DEFAULT_RECENT_HOURS: i64 = 24;

/// Longest look-back `/recent` accepts (one year).
pub const MAX_RECENT_HOURS: i64 = 24 * 366;

/// Pagination and visibility parameters (`?limit=&offset=&include_inactive=`).
///
/// Values are clamped in the store layer.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub include_inactive: bool,
}

impl ListParams {
    pub fn filter(&self, source: Option<Source>) -> ListFilter {
        ListFilter {
            source,
            include_inactive: self.include_inactive,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// `?q=&source=` for keyword search.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub source: Option<String>,
}

impl SearchParams {
    /// The trimmed keyword, rejecting an empty one.
    pub fn keyword(&self) -> Result<&str, AppError> {
        let q = self.q.trim();
        if q.is_empty() {
            return Err(AppError::BadRequest("q must not be empty".into()));
        }
        Ok(q)
    }

    pub fn source(&self) -> Result<Option<Source>, AppError> {
        parse_source(self.source.as_deref())
    }
}

/// `?hours=` for recently collected notices.
#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub hours: Option<i64>,
}

impl RecentParams {
    pub fn hours(&self) -> Result<i64, AppError> {
        match self.hours {
            None => Ok(DEFAULT_RECENT_HOURS),
            Some(h) if (1..=MAX_RECENT_HOURS).contains(&h) => Ok(h),
            Some(h) => Err(AppError::BadRequest(format!(
                "hours must be between 1 and {MAX_RECENT_HOURS}, got {h}"
            ))),
        }
    }
}

/// Parse an optional `source` parameter; blank means "all sources".
pub fn parse_source(raw: Option<&str>) -> Result<Option<Source>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e: legis_core::source::UnknownSource| AppError::BadRequest(e.to_string())),
    }
}
