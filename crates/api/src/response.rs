//! Response envelopes for API handlers.
//!
//! Listing endpoints keep the `{ success, message, data, total_count,
//! timestamp }` shape the dashboard consumes; supplementary endpoints use
//! the plain [`DataResponse`] envelope.

use chrono::Utc;
use legis_core::legislation::StoredLegislation;
use legis_core::source::Source;
use legis_core::types::Timestamp;
use legis_pipeline::{RefreshError, RefreshReport};
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Envelope for notice listings.
#[derive(Debug, Serialize)]
pub struct LegislationResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<StoredLegislation>,
    /// Number of notices matching the query, ignoring `limit`/`offset`.
    pub total_count: i64,
    pub timestamp: Timestamp,
}

impl LegislationResponse {
    pub fn ok(message: impl Into<String>, data: Vec<StoredLegislation>, total_count: i64) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            total_count,
            timestamp: Utc::now(),
        }
    }

    /// A response whose total is the length of `data`.
    pub fn unpaged(message: impl Into<String>, data: Vec<StoredLegislation>) -> Self {
        let total_count = data.len() as i64;
        Self::ok(message, data, total_count)
    }
}

/// Body of `POST /api/legislation/refresh`.
///
/// Every refresh outcome is reported here with HTTP 200; `success` is false
/// when the cycle was rejected, could not run at all, or lost writes to
/// persistence conflicts.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    pub national_count: u64,
    pub admin_count: u64,
    pub total_count: u64,
    /// Final status of the cycle (`completed`, `completed_with_partial_failure`,
    /// `failed`), or `rejected` when another cycle was already running.
    pub status: &'static str,
    pub rejected_count: u64,
    /// Notices not written because a concurrent write won.
    pub conflict_count: u64,
    pub failed_sources: Vec<Source>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
}

impl From<Result<RefreshReport, RefreshError>> for RefreshResponse {
    fn from(result: Result<RefreshReport, RefreshError>) -> Self {
        match result {
            Ok(report) => {
                let failed_sources = report.failed_sources();
                let conflict_count = report.conflicts();
                let mut message = if failed_sources.is_empty() {
                    "데이터가 성공적으로 새로고침되었습니다.".to_string()
                } else {
                    let names: Vec<&str> = failed_sources.iter().map(|s| s.as_str()).collect();
                    format!(
                        "데이터가 새로고침되었지만 일부 출처 수집에 실패했습니다: {}",
                        names.join(", ")
                    )
                };
                if conflict_count > 0 {
                    message = format!(
                        "{message} 동시 저장 충돌로 {conflict_count}건이 반영되지 않았습니다."
                    );
                }
                Self {
                    success: conflict_count == 0,
                    message,
                    national_count: report.count(Source::National),
                    admin_count: report.count(Source::Admin),
                    total_count: report.total_count(),
                    status: report.status.as_str(),
                    rejected_count: report.rejected(),
                    conflict_count,
                    failed_sources,
                    started_at: Some(report.started_at),
                    finished_at: Some(report.finished_at),
                }
            }
            Err(err) => {
                let (status, started_at) = match &err {
                    RefreshError::InProgress { started_at } => ("rejected", Some(*started_at)),
                    RefreshError::StoreUnavailable(_) | RefreshError::Aborted(_) => ("failed", None),
                };
                Self {
                    success: false,
                    message: err.to_string(),
                    national_count: 0,
                    admin_count: 0,
                    total_count: 0,
                    status,
                    rejected_count: 0,
                    conflict_count: 0,
                    failed_sources: Vec::new(),
                    started_at,
                    finished_at: None,
                }
            }
        }
    }
}
