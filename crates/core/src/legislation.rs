//! Raw, canonical and persisted shapes of a legislative notice.

use serde::{Deserialize, Serialize};

use crate::source::Source;
use crate::types::{Date, Timestamp};

// ---------------------------------------------------------------------------
// Raw records (adapter output)
// ---------------------------------------------------------------------------

/// A notice as an adapter scraped it, before any validation.
///
/// Every field is optional and uncleaned. Dates are kept as the text the
/// source published; adapters fill either `posted_from`/`posted_until` or
/// `posting_period` (a `start ~ end` range), whichever the page offers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    pub bill_no: Option<String>,
    pub title: Option<String>,
    pub committee: Option<String>,
    pub proposer: Option<String>,
    pub posted_from: Option<String>,
    pub posted_until: Option<String>,
    pub posting_period: Option<String>,
    pub content: Option<String>,
    pub link_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Canonical item (normalizer output)
// ---------------------------------------------------------------------------

/// A validated, normalized notice ready for reconciliation.
///
/// Produced by [`normalize`](crate::normalize::normalize) and never mutated
/// afterwards; the store decides what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegislationItem {
    pub id: String,
    pub title: String,
    pub committee: String,
    pub proposer: Option<String>,
    pub start_date: Date,
    /// `None` means no announced deadline.
    pub end_date: Option<Date>,
    pub content: String,
    pub link_url: Option<String>,
    pub bill_no: Option<String>,
    pub source: Source,
}

// ---------------------------------------------------------------------------
// Persisted item
// ---------------------------------------------------------------------------

/// A notice as the store holds it: the canonical fields plus bookkeeping.
///
/// Serializes flat, which is the wire shape the dashboard consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLegislation {
    #[serde(flatten)]
    pub item: LegislationItem,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub is_active: bool,
}

impl StoredLegislation {
    /// A freshly inserted row.
    pub fn new(item: LegislationItem, now: Timestamp) -> Self {
        Self {
            item,
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }
}
