//! Date parsing for the formats the upstream sites publish.
//!
//! The national site uses `2024-01-05`, the administrative site
//! `2024. 1. 5.`, and the Open API occasionally `20240105`. Everything is
//! mapped to a [`Date`].

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Date;

/// `YYYY` + separator + `M` + separator + `D`, separators `-`, `.`, `/` or
/// spaces, with an optional trailing dot.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[./\-]\s*(\d{1,2})\s*[./\-]\s*(\d{1,2})\.?").expect("valid regex")
});

/// Compact `YYYYMMDD`.
static COMPACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})$").expect("valid regex"));

/// Parse a single date. Returns `None` if `raw` holds no recognisable date
/// or the date does not exist on the calendar.
pub fn parse_date(raw: &str) -> Option<Date> {
    let trimmed = raw.trim();

    let caps = DATE_RE
        .captures(trimmed)
        .or_else(|| COMPACT_RE.captures(trimmed))?;

    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    Date::from_ymd_opt(year, month, day)
}

/// A posting period split into its raw halves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodText<'a> {
    pub start: &'a str,
    pub end: Option<&'a str>,
}

/// Split a period like `2024. 1. 5. ~ 2024. 1. 25.` on the tilde.
///
/// A period without a tilde is a single start date with no deadline.
pub fn split_period(raw: &str) -> PeriodText<'_> {
    match raw.split_once('~') {
        Some((start, end)) => {
            let end = end.trim();
            PeriodText {
                start: start.trim(),
                end: (!end.is_empty()).then_some(end),
            }
        }
        None => PeriodText {
            start: raw.trim(),
            end: None,
        },
    }
}
