//! What a refresh cycle did, per source and overall.

use legis_core::adapter::AdapterError;
use legis_core::reconcile::ReconcileOutcome;
use legis_core::source::Source;
use legis_core::types::Timestamp;
use serde::Serialize;

/// Lifecycle of the orchestrator's refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    Idle,
    Running,
    Completed,
    CompletedWithPartialFailure,
    Failed,
}

impl RefreshStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshStatus::Idle => "idle",
            RefreshStatus::Running => "running",
            RefreshStatus::Completed => "completed",
            RefreshStatus::CompletedWithPartialFailure => "completed_with_partial_failure",
            RefreshStatus::Failed => "failed",
        }
    }
}

/// Current refresh state as exposed by `GET /api/legislation/refresh/status`.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshState {
    pub status: RefreshStatus,
    /// Start of the running or most recent cycle.
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    /// Report of the most recent finished cycle.
    pub last_report: Option<RefreshReport>,
    /// Why the most recent cycle failed, if it did.
    pub last_error: Option<String>,
}

impl Default for RefreshState {
    fn default() -> Self {
        Self {
            status: RefreshStatus::Idle,
            started_at: None,
            finished_at: None,
            last_report: None,
            last_error: None,
        }
    }
}

/// Outcome of one source within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: Source,
    /// Raw records the adapter returned.
    pub fetched: usize,
    /// Records dropped by the normalizer.
    pub rejected: u64,
    /// Valid records outside the collection window.
    pub skipped: u64,
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
    /// Inserts that lost a race with a concurrent writer.
    pub conflicts: u64,
    /// Stored notices in the window the source no longer lists.
    pub withdrawn: u64,
    /// Set when the adapter or the store failed for this source.
    pub error: Option<String>,
}

impl SourceReport {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            fetched: 0,
            rejected: 0,
            skipped: 0,
            inserted: 0,
            updated: 0,
            unchanged: 0,
            conflicts: 0,
            withdrawn: 0,
            error: None,
        }
    }

    pub fn adapter_failed(source: Source, err: &AdapterError) -> Self {
        Self {
            error: Some(format!("{}: {err}", err.kind())),
            ..Self::new(source)
        }
    }

    pub fn record(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Inserted => self.inserted += 1,
            ReconcileOutcome::Updated => self.updated += 1,
            ReconcileOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Items actually written this cycle.
    pub fn persisted(&self) -> u64 {
        self.inserted + self.updated
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of one finished refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub status: RefreshStatus,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub sources: Vec<SourceReport>,
    /// Notices closed by their end date during this cycle.
    pub expired: u64,
}

impl RefreshReport {
    /// Persisted items (inserted + updated) for `source`.
    pub fn count(&self, source: Source) -> u64 {
        self.sources
            .iter()
            .filter(|s| s.source == source)
            .map(SourceReport::persisted)
            .sum()
    }

    pub fn total_count(&self) -> u64 {
        self.sources.iter().map(SourceReport::persisted).sum()
    }

    pub fn rejected(&self) -> u64 {
        self.sources.iter().map(|s| s.rejected).sum()
    }

    pub fn conflicts(&self) -> u64 {
        self.sources.iter().map(|s| s.conflicts).sum()
    }

    pub fn failed_sources(&self) -> Vec<Source> {
        self.sources
            .iter()
            .filter(|s| s.failed())
            .map(|s| s.source)
            .collect()
    }

    pub fn source(&self, source: Source) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.source == source)
    }
}
