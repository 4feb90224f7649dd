//! Insert / update / no-op decision for a candidate against the stored row.
//!
//! Comparison is field-by-field over the content fields, never a digest,
//! so an "unchanged" verdict is exact and the changed fields can be logged.

use chrono::TimeDelta;
use serde::Serialize;

use crate::legislation::{LegislationItem, StoredLegislation};
use crate::types::{Date, Timestamp};

/// Fields whose change makes a stored notice "updated".
pub const CONTENT_FIELDS: &[&str] = &[
    "title",
    "committee",
    "proposer",
    "start_date",
    "end_date",
    "content",
    "link_url",
    "bill_no",
];

/// Pseudo-field reported when an inactive row is seen upstream again.
pub const REACTIVATED: &str = "is_active";

/// Default age, in days, after which stored notices are deactivated.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Longest accepted retention, in days.
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Retention period for `days`, or `None` when outside
/// `1..=MAX_RETENTION_DAYS`.
pub fn retention_period(days: i64) -> Option<TimeDelta> {
    if !(1..=MAX_RETENTION_DAYS).contains(&days) {
        return None;
    }
    TimeDelta::try_days(days)
}

/// When a sighted notice is allowed to be (or become) active.
///
/// A notice is live when it has not closed before `today` and, if it is
/// already stored, was first stored at or after `retained_since`. Rows aged
/// past retention or closed upstream stay inactive when sighted again; their
/// content is still kept current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveness {
    pub today: Date,
    pub retained_since: Option<Timestamp>,
}

impl Liveness {
    pub fn new(today: Date) -> Self {
        Self {
            today,
            retained_since: None,
        }
    }

    pub fn with_retained_since(mut self, cutoff: Timestamp) -> Self {
        self.retained_since = Some(cutoff);
        self
    }

    /// Whether `item` is still open for comment on `today`.
    pub fn is_open(&self, item: &LegislationItem) -> bool {
        item.end_date.map_or(true, |end| end >= self.today)
    }

    /// Whether `stored` is young enough to be active.
    pub fn retains(&self, stored: &StoredLegislation) -> bool {
        self.retained_since.map_or(true, |cutoff| stored.created_at >= cutoff)
    }
}

/// What a reconcile did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Inserted,
    Updated,
    Unchanged,
}

impl ReconcileOutcome {
    /// Whether the store was written.
    pub fn persisted(self) -> bool {
        !matches!(self, ReconcileOutcome::Unchanged)
    }
}

/// The write a store must perform for a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileDecision {
    Insert,
    Update { changed: Vec<&'static str> },
    Unchanged,
}

impl ReconcileDecision {
    /// Whether an update flips an inactive row back to active.
    pub fn reactivates(&self) -> bool {
        matches!(self, ReconcileDecision::Update { changed } if changed.contains(&REACTIVATED))
    }

    pub fn outcome(&self) -> ReconcileOutcome {
        match self {
            ReconcileDecision::Insert => ReconcileOutcome::Inserted,
            ReconcileDecision::Update { .. } => ReconcileOutcome::Updated,
            ReconcileDecision::Unchanged => ReconcileOutcome::Unchanged,
        }
    }
}

/// Decide how `candidate` relates to the row currently stored under the
/// same `(source, id)`.
///
/// An inactive row is reactivated only when `liveness` allows it.
pub fn decide(
    existing: Option<&StoredLegislation>,
    candidate: &LegislationItem,
    liveness: &Liveness,
) -> ReconcileDecision {
    let Some(existing) = existing else {
        return ReconcileDecision::Insert;
    };

    let mut changed = changed_fields(&existing.item, candidate);
    if !existing.is_active && liveness.is_open(candidate) && liveness.retains(existing) {
        changed.push(REACTIVATED);
    }

    if changed.is_empty() {
        ReconcileDecision::Unchanged
    } else {
        ReconcileDecision::Update { changed }
    }
}

/// Names of the content fields that differ between `stored` and `candidate`.
pub fn changed_fields(stored: &LegislationItem, candidate: &LegislationItem) -> Vec<&'static str> {
    let mut changed = Vec::new();

    if stored.title != candidate.title {
        changed.push("title");
    }
    if stored.committee != candidate.committee {
        changed.push("committee");
    }
    if stored.proposer != candidate.proposer {
        changed.push("proposer");
    }
    if stored.start_date != candidate.start_date {
        changed.push("start_date");
    }
    if stored.end_date != candidate.end_date {
        changed.push("end_date");
    }
    if stored.content != candidate.content {
        changed.push("content");
    }
    if stored.link_url != candidate.link_url {
        changed.push("link_url");
    }
    if stored.bill_no != candidate.bill_no {
        changed.push("bill_no");
    }

    changed
}

/// The row to store for an inserted candidate. A notice that has already
/// closed is stored inactive.
pub fn insert_row(candidate: &LegislationItem, liveness: &Liveness, now: Timestamp) -> StoredLegislation {
    let mut row = StoredLegislation::new(candidate.clone(), now);
    row.is_active = liveness.is_open(candidate);
    row
}

/// Apply an update decision to an in-memory row: content fields are
/// replaced, identity and `created_at` are kept.
pub fn apply_update(
    stored: &mut StoredLegislation,
    candidate: &LegislationItem,
    reactivate: bool,
    now: Timestamp,
) {
    let item = &mut stored.item;
    item.title.clone_from(&candidate.title);
    item.committee.clone_from(&candidate.committee);
    item.proposer.clone_from(&candidate.proposer);
    item.start_date = candidate.start_date;
    item.end_date = candidate.end_date;
    item.content.clone_from(&candidate.content);
    item.link_url.clone_from(&candidate.link_url);
    item.bill_no.clone_from(&candidate.bill_no);
    if reactivate {
        stored.is_active = true;
    }
    stored.updated_at = now;
}
