//! Handlers for the `/api/legislation` resource.
//!
//! Listings only read the store. Collection happens exclusively through
//! `POST /refresh`, the scheduler, or the worker binary.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use legis_core::source::Source;
use legis_db::models::legislation::LegislationStatistics;
use legis_pipeline::RefreshState;
use serde::Serialize;

use crate::error::AppResult;
use crate::query::{ListParams, RecentParams, SearchParams};
use crate::response::{DataResponse, LegislationResponse, RefreshResponse};
use crate::state::AppState;

/// GET /api/legislation/all
pub async fn list_all(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<LegislationResponse>> {
    list(&state, &params, None, "모든 입법예고 데이터를 성공적으로 가져왔습니다.").await
}

/// GET /api/legislation/national
pub async fn list_national(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<LegislationResponse>> {
    list(
        &state,
        &params,
        Some(Source::National),
        "입법부 입법예고 데이터를 성공적으로 가져왔습니다.",
    )
    .await
}

/// GET /api/legislation/admin
pub async fn list_admin(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<LegislationResponse>> {
    list(
        &state,
        &params,
        Some(Source::Admin),
        "행정부 입법예고 데이터를 성공적으로 가져왔습니다.",
    )
    .await
}

async fn list(
    state: &AppState,
    params: &ListParams,
    source: Option<Source>,
    message: &str,
) -> AppResult<Json<LegislationResponse>> {
    let filter = params.filter(source);
    let data = state.store.list(&filter).await?;
    let total_count = state.store.count(&filter).await?;
    Ok(Json(LegislationResponse::ok(message, data, total_count)))
}

/// POST /api/legislation/refresh
///
/// Runs one refresh cycle and reports it. Always answers 200: a rejected or
/// failed cycle is reported with `success: false`.
pub async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    let result = state.orchestrator.refresh_all().await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Refresh request did not run a cycle");
    }
    Json(RefreshResponse::from(result))
}

/// GET /api/legislation/refresh/status
pub async fn refresh_status(State(state): State<AppState>) -> Json<DataResponse<RefreshState>> {
    Json(DataResponse {
        data: state.orchestrator.state(),
    })
}

/// GET /api/legislation/search?q=&source=
///
/// Case-insensitive keyword match over title, committee and content of
/// active notices.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<LegislationResponse>> {
    let keyword = params.keyword()?;
    let source = params.source()?;
    let data = state.store.search(keyword, source).await?;
    Ok(Json(LegislationResponse::unpaged(
        format!("'{keyword}' 검색 결과입니다."),
        data,
    )))
}

/// GET /api/legislation/recent?hours=
pub async fn recent(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> AppResult<Json<LegislationResponse>> {
    let hours = params.hours()?;
    let since = Utc::now() - Duration::hours(hours);
    let data = state.store.recent(since).await?;
    Ok(Json(LegislationResponse::unpaged(
        format!("최근 {hours}시간 내 수집된 입법예고입니다."),
        data,
    )))
}

/// Store totals plus the process-wide rejected-record counter.
#[derive(Debug, Serialize)]
pub struct LegislationStats {
    #[serde(flatten)]
    pub store: LegislationStatistics,
    pub rejected_total: u64,
}

/// GET /api/legislation/stats
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<DataResponse<LegislationStats>>> {
    let store = state.store.statistics().await?;
    Ok(Json(DataResponse {
        data: LegislationStats {
            store,
            rejected_total: state.orchestrator.rejected_total(),
        },
    }))
}
