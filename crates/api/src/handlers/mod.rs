//! Request handlers.
//!
//! Handlers delegate to the [`LegislationStore`](legis_db::LegislationStore)
//! or the refresh orchestrator held in [`AppState`](crate::state::AppState)
//! and map failures via [`AppError`](crate::error::AppError).

pub mod legislation;
