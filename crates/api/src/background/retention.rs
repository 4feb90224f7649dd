//! Periodic deactivation of old notices.
//!
//! Rows first stored longer ago than the retention period are marked
//! inactive, never deleted, so listings can still show them with
//! `include_inactive`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use legis_db::LegislationStore;
use tokio_util::sync::CancellationToken;

/// How often the retention job runs.
const RETENTION_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the retention loop until `cancel` is triggered.
pub async fn run(store: Arc<dyn LegislationStore>, retention: TimeDelta, cancel: CancellationToken) {
    tracing::info!(
        retention_days = retention.num_days(),
        interval_secs = RETENTION_INTERVAL.as_secs(),
        "Notice retention job started"
    );

    let mut interval = tokio::time::interval(RETENTION_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Notice retention job stopping");
                break;
            }
            _ = interval.tick() => {
                sweep(store.as_ref(), retention).await;
            }
        }
    }
}

/// One retention pass. Returns the number of rows deactivated.
pub async fn sweep(store: &dyn LegislationStore, retention: TimeDelta) -> u64 {
    let now = Utc::now();
    let Some(cutoff) = now.checked_sub_signed(retention) else {
        tracing::error!(?retention, "Notice retention: period out of range");
        return 0;
    };
    match store.deactivate_created_before(cutoff, now).await {
        Ok(deactivated) => {
            if deactivated > 0 {
                tracing::info!(deactivated, %cutoff, "Notice retention: deactivated old rows");
            } else {
                tracing::debug!("Notice retention: nothing to deactivate");
            }
            deactivated
        }
        Err(e) => {
            tracing::error!(error = %e, "Notice retention: sweep failed");
            0
        }
    }
}
