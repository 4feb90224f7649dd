//! One candidate → one reconcile against the store, with audit logging.

use legis_core::legislation::LegislationItem;
use legis_core::reconcile::{Liveness, ReconcileDecision, ReconcileOutcome};
use legis_core::types::Timestamp;
use legis_db::{LegislationStore, StoreError};

/// Reconcile `item` and log what changed.
///
/// A newly inserted item whose `link_url` is already stored under another
/// id of the same source is logged as a possible duplicate; it is still
/// inserted.
pub async fn upsert(
    store: &dyn LegislationStore,
    item: &LegislationItem,
    liveness: &Liveness,
    now: Timestamp,
) -> Result<ReconcileOutcome, StoreError> {
    let decision = store.reconcile(item, liveness, now).await?;

    match &decision {
        ReconcileDecision::Insert => {
            tracing::debug!(source = %item.source, id = %item.id, "Inserted notice");
            warn_on_link_duplicate(store, item).await;
        }
        ReconcileDecision::Update { changed } => {
            tracing::debug!(
                source = %item.source,
                id = %item.id,
                changed = ?changed,
                "Updated notice",
            );
        }
        ReconcileDecision::Unchanged => {}
    }

    Ok(decision.outcome())
}

async fn warn_on_link_duplicate(store: &dyn LegislationStore, item: &LegislationItem) {
    let Some(link_url) = item.link_url.as_deref() else {
        return;
    };

    match store.find_by_link_url(item.source, link_url).await {
        Ok(rows) => {
            for other in rows.iter().filter(|r| r.item.id != item.id) {
                tracing::warn!(
                    source = %item.source,
                    id = %item.id,
                    other_id = %other.item.id,
                    link_url,
                    "Possible duplicate notice: link URL already stored under another id",
                );
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, link_url, "Duplicate check by link URL failed");
        }
    }
}
