use axum::routing::{get, post};
use axum::Router;

use crate::handlers::legislation;
use crate::state::AppState;

/// Routes mounted at `/api/legislation`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all", get(legislation::list_all))
        .route("/national", get(legislation::list_national))
        .route("/admin", get(legislation::list_admin))
        .route("/refresh", post(legislation::refresh))
        .route("/refresh/status", get(legislation::refresh_status))
        .route("/search", get(legislation::search))
        .route("/recent", get(legislation::recent))
        .route("/stats", get(legislation::stats))
}
