//! Optional date targeting for a refresh cycle.

use chrono::Days;

use crate::legislation::LegislationItem;
use crate::types::Date;

/// A lookback window a refresh cycle can be narrowed to.
///
/// A windowed cycle keeps notices posted on or after `since` that have not
/// closed before `today`. Anything stored inside the window that the cycle
/// did not see is treated as withdrawn upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectWindow {
    pub today: Date,
    pub since: Date,
}

impl CollectWindow {
    /// Window covering `lookback_days` before `today`.
    pub fn new(today: Date, lookback_days: u64) -> Self {
        let since = today.checked_sub_days(Days::new(lookback_days)).unwrap_or(today);
        Self { today, since }
    }

    /// Whether `item` belongs to this cycle.
    pub fn admits(&self, item: &LegislationItem) -> bool {
        item.start_date >= self.since && item.end_date.map_or(true, |end| end >= self.today)
    }
}
