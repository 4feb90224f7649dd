pub mod health;
pub mod legislation;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /legislation/all                 GET   all active notices
/// /legislation/national            GET   national assembly notices
/// /legislation/admin               GET   administrative notices
/// /legislation/refresh             POST  run a refresh cycle
/// /legislation/refresh/status      GET   current refresh state
/// /legislation/search              GET   keyword search (?q=&source=)
/// /legislation/recent              GET   recently collected (?hours=)
/// /legislation/stats               GET   store totals
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/legislation", legislation::router())
}
