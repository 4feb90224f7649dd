use std::sync::Arc;

use legis_db::LegislationStore;
use legis_pipeline::RefreshOrchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Notice store (PostgreSQL or in-memory).
    pub store: Arc<dyn LegislationStore>,
    /// The single refresh orchestrator of this process.
    pub orchestrator: Arc<RefreshOrchestrator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
