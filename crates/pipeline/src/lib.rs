//! The refresh pipeline: adapters → normalizer → reconcile → store.

pub mod calendar;
pub mod orchestrator;
pub mod report;
pub mod upsert;

pub use calendar::{Calendar, LocalCalendar};
pub use orchestrator::{RefreshError, RefreshOrchestrator};
pub use report::{RefreshReport, RefreshState, RefreshStatus, SourceReport};
