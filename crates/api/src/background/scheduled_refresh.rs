//! Periodic refresh of every registered source.
//!
//! The first cycle runs immediately so a fresh process starts with current
//! data. A tick that lands while a cycle is still running (a manual refresh,
//! or a slow previous tick) is rejected by the orchestrator and skipped.

use std::sync::Arc;
use std::time::Duration;

use legis_pipeline::{RefreshError, RefreshOrchestrator};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the scheduled refresh loop until `cancel` is triggered.
pub async fn run(orchestrator: Arc<RefreshOrchestrator>, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Scheduled refresh started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Scheduled refresh stopping");
                break;
            }
            _ = interval.tick() => {
                match orchestrator.refresh_all().await {
                    Ok(report) => tracing::info!(
                        status = report.status.as_str(),
                        total_count = report.total_count(),
                        rejected = report.rejected(),
                        "Scheduled refresh: cycle finished"
                    ),
                    Err(RefreshError::InProgress { started_at }) => tracing::debug!(
                        %started_at,
                        "Scheduled refresh: skipped, a cycle is already running"
                    ),
                    Err(e) => tracing::error!(error = %e, "Scheduled refresh: cycle failed"),
                }
            }
        }
    }
}
