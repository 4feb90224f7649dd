//! Refresh orchestrator.
//!
//! Runs one refresh cycle at a time across the registered adapters: each
//! source is fetched, normalized and reconciled in its own task, so one
//! source failing never stops the others. A second refresh while one is
//! running is rejected with [`RefreshError::InProgress`].
//!
//! By default every valid record an adapter returns is reconciled. A
//! lookback window can narrow a cycle to recently posted notices.
//!
//! The cycle runs in a detached task. Dropping the future returned by
//! [`RefreshOrchestrator::refresh`] (client disconnect, request timeout)
//! does not cancel it; its outcome lands in [`RefreshOrchestrator::state`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{TimeDelta, Utc};
use legis_core::adapter::SourceAdapter;
use legis_core::normalize::normalize;
use legis_core::reconcile::Liveness;
use legis_core::source::Source;
use legis_core::types::{Date, Timestamp};
use legis_core::window::CollectWindow;
use legis_db::LegislationStore;

use crate::calendar::{Calendar, LocalCalendar};
use crate::report::{RefreshReport, RefreshState, RefreshStatus, SourceReport};
use crate::upsert::upsert;

/// Why a refresh did not produce a report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("A refresh is already in progress (started at {started_at})")]
    InProgress { started_at: Timestamp },

    /// The store cannot be reached, so nothing could be reconciled.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The cycle task ended without a result.
    #[error("Refresh aborted: {0}")]
    Aborted(String),
}

pub struct RefreshOrchestrator {
    store: Arc<dyn LegislationStore>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    calendar: Arc<dyn Calendar>,
    lookback_days: Option<u64>,
    retention: Option<TimeDelta>,
    state: Mutex<RefreshState>,
    rejected_total: AtomicU64,
}

impl RefreshOrchestrator {
    pub fn new(store: Arc<dyn LegislationStore>, adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self {
            store,
            adapters,
            calendar: Arc::new(LocalCalendar),
            lookback_days: None,
            retention: None,
            state: Mutex::new(RefreshState::default()),
            rejected_total: AtomicU64::new(0),
        }
    }

    /// Only reconcile notices posted within `days` before today that are
    /// still open. Off by default.
    pub fn with_lookback_days(mut self, days: u64) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Rows first stored longer ago than `retention` are not reactivated
    /// when sighted again.
    pub fn with_retention(mut self, retention: TimeDelta) -> Self {
        self.retention = Some(retention);
        self
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn Calendar>) -> Self {
        self.calendar = calendar;
        self
    }

    /// Snapshot of the current refresh state.
    pub fn state(&self) -> RefreshState {
        self.lock_state().clone()
    }

    /// Records rejected by the normalizer since startup.
    pub fn rejected_total(&self) -> u64 {
        self.rejected_total.load(Ordering::Relaxed)
    }

    /// Sources with a registered adapter.
    pub fn sources(&self) -> Vec<Source> {
        self.adapters.iter().map(|a| a.source()).collect()
    }

    /// Refresh every registered source.
    pub async fn refresh_all(self: &Arc<Self>) -> Result<RefreshReport, RefreshError> {
        let sources = self.sources();
        self.refresh(&sources).await
    }

    /// Refresh `sources` only.
    pub async fn refresh(self: &Arc<Self>, sources: &[Source]) -> Result<RefreshReport, RefreshError> {
        let started_at = self.begin()?;
        tracing::info!(sources = ?sources, "Refresh cycle started");

        let this = Arc::clone(self);
        let sources = sources.to_vec();
        let cycle = tokio::spawn(async move {
            let mut guard = CycleGuard {
                orchestrator: &this,
                finished: false,
            };
            let result = this.run_cycle(started_at, &sources).await;
            this.finish(started_at, &result);
            guard.finished = true;
            result
        });

        cycle
            .await
            .unwrap_or_else(|e| Err(RefreshError::Aborted(e.to_string())))
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `Running`, or reject if a cycle is already running.
    fn begin(&self) -> Result<Timestamp, RefreshError> {
        let mut state = self.lock_state();
        if state.status == RefreshStatus::Running {
            let started_at = state.started_at.unwrap_or_else(Utc::now);
            tracing::info!(%started_at, "Refresh rejected: already in progress");
            return Err(RefreshError::InProgress { started_at });
        }

        let now = Utc::now();
        state.status = RefreshStatus::Running;
        state.started_at = Some(now);
        state.finished_at = None;
        Ok(now)
    }

    fn finish(&self, started_at: Timestamp, result: &Result<RefreshReport, RefreshError>) {
        let mut state = self.lock_state();
        match result {
            Ok(report) => {
                state.status = report.status;
                state.finished_at = Some(report.finished_at);
                state.last_report = Some(report.clone());
                state.last_error = None;
            }
            Err(e) => {
                state.status = RefreshStatus::Failed;
                state.finished_at = Some(Utc::now());
                state.last_error = Some(e.to_string());
            }
        }
        tracing::info!(
            status = state.status.as_str(),
            elapsed_ms = (Utc::now() - started_at).num_milliseconds(),
            "Refresh cycle finished",
        );
    }

    async fn run_cycle(
        &self,
        started_at: Timestamp,
        sources: &[Source],
    ) -> Result<RefreshReport, RefreshError> {
        if let Err(e) = self.store.health_check().await {
            tracing::error!(error = %e, "Refresh aborted: store unavailable");
            return Err(RefreshError::StoreUnavailable(e.to_string()));
        }

        let today = self.calendar.today();
        let window = self.lookback_days.map(|days| CollectWindow::new(today, days));
        let liveness = self.liveness(today);

        let tasks: Vec<_> = sources
            .iter()
            .map(|&source| {
                let adapter = self.adapters.iter().find(|a| a.source() == source).cloned();
                let store = Arc::clone(&self.store);
                let task = adapter
                    .map(|adapter| tokio::spawn(collect_source(store, adapter, window, liveness)));
                (source, task)
            })
            .collect();

        let mut reports = Vec::with_capacity(tasks.len());
        for (source, task) in tasks {
            let report = match task {
                Some(handle) => handle.await.unwrap_or_else(|e| SourceReport {
                    error: Some(format!("task failed: {e}")),
                    ..SourceReport::new(source)
                }),
                None => SourceReport {
                    error: Some("no adapter configured".into()),
                    ..SourceReport::new(source)
                },
            };
            self.rejected_total.fetch_add(report.rejected, Ordering::Relaxed);
            reports.push(report);
        }

        let expired = match self.store.deactivate_expired(today, Utc::now()).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "Closing expired notices failed");
                0
            }
        };

        let status = if reports.iter().any(SourceReport::failed) {
            RefreshStatus::CompletedWithPartialFailure
        } else {
            RefreshStatus::Completed
        };

        let report = RefreshReport {
            status,
            started_at,
            finished_at: Utc::now(),
            sources: reports,
            expired,
        };

        tracing::info!(
            total = report.total_count(),
            national = report.count(Source::National),
            admin = report.count(Source::Admin),
            rejected = report.rejected(),
            conflicts = report.conflicts(),
            expired,
            "Refresh cycle report",
        );

        Ok(report)
    }

    fn liveness(&self, today: Date) -> Liveness {
        let liveness = Liveness::new(today);
        match self
            .retention
            .and_then(|retention| Utc::now().checked_sub_signed(retention))
        {
            Some(cutoff) => liveness.with_retained_since(cutoff),
            None => liveness,
        }
    }
}

/// Marks the cycle failed if its task unwinds before finishing.
struct CycleGuard<'a> {
    orchestrator: &'a RefreshOrchestrator,
    finished: bool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = self.orchestrator.lock_state();
            state.status = RefreshStatus::Failed;
            state.finished_at = Some(Utc::now());
            state.last_error = Some("refresh cycle aborted".into());
        }
    }
}

/// Fetch, normalize and reconcile one source.
///
/// Stored notices the adapter did not return are withdrawn only within the
/// date range the cycle covered: the lookback window when one is set,
/// otherwise from the earliest start date returned.
async fn collect_source(
    store: Arc<dyn LegislationStore>,
    adapter: Arc<dyn SourceAdapter>,
    window: Option<CollectWindow>,
    liveness: Liveness,
) -> SourceReport {
    let source = adapter.source();

    let records = match adapter.fetch().await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(source = %source, kind = e.kind(), error = %e, "Adapter failed");
            return SourceReport::adapter_failed(source, &e);
        }
    };

    let mut report = SourceReport::new(source);
    report.fetched = records.len();
    let mut seen = Vec::with_capacity(records.len());
    let mut earliest: Option<Date> = None;

    for raw in &records {
        let item = match normalize(raw, source) {
            Ok(item) => item,
            Err(e) => {
                report.rejected += 1;
                tracing::debug!(source = %source, error = %e, title = ?raw.title, "Record rejected");
                continue;
            }
        };

        if window.is_some_and(|w| !w.admits(&item)) {
            report.skipped += 1;
            continue;
        }
        seen.push(item.id.clone());
        earliest = Some(earliest.map_or(item.start_date, |d| d.min(item.start_date)));

        match upsert(store.as_ref(), &item, &liveness, Utc::now()).await {
            Ok(outcome) => report.record(outcome),
            Err(e) if e.is_conflict() => {
                report.conflicts += 1;
                tracing::warn!(source = %source, id = %item.id, error = %e, "Persistence conflict");
            }
            Err(e) => {
                tracing::error!(source = %source, error = %e, "Store failed mid-cycle");
                report.error = Some(format!("store: {e}"));
                return report;
            }
        }
    }

    if let Some(since) = window.map(|w| w.since).or(earliest) {
        match store.deactivate_unseen(source, since, &seen, Utc::now()).await {
            Ok(n) => report.withdrawn = n,
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "Marking withdrawn notices failed")
            }
        }
    }

    tracing::info!(
        source = %source,
        fetched = report.fetched,
        inserted = report.inserted,
        updated = report.updated,
        unchanged = report.unchanged,
        rejected = report.rejected,
        skipped = report.skipped,
        withdrawn = report.withdrawn,
        "Source reconciled",
    );

    report
}
