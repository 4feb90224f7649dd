//! Raw record → canonical [`LegislationItem`].
//!
//! Pure: no I/O, no clock. Records missing a required field are rejected
//! with a [`ValidationError`] instead of being padded with empty strings.

use crate::dates::{parse_date, split_period};
use crate::error::ValidationError;
use crate::identity::derive_id;
use crate::legislation::{LegislationItem, RawRecord};
use crate::source::Source;
use crate::text::{clean_optional, PLACEHOLDERS};
use crate::types::Date;

/// Normalize one raw record from `source`.
pub fn normalize(raw: &RawRecord, source: Source) -> Result<LegislationItem, ValidationError> {
    let title = clean_optional(raw.title.as_deref()).ok_or(ValidationError::MissingField("title"))?;
    let committee = clean_optional(raw.committee.as_deref())
        .ok_or(ValidationError::MissingField("committee"))?;

    let (start_date, end_date) = posting_dates(raw)?;
    if let Some(end) = end_date {
        if end < start_date {
            return Err(ValidationError::EndBeforeStart {
                start: start_date,
                end,
            });
        }
    }

    let bill_no = clean_optional(raw.bill_no.as_deref());
    let id = derive_id(source, bill_no.as_deref(), &title, &committee);

    Ok(LegislationItem {
        id,
        title,
        committee,
        proposer: clean_optional(raw.proposer.as_deref()),
        start_date,
        end_date,
        content: clean_optional(raw.content.as_deref()).unwrap_or_default(),
        link_url: clean_optional(raw.link_url.as_deref()),
        bill_no,
        source,
    })
}

/// Resolve the posting dates, preferring explicit fields over the range text.
fn posting_dates(raw: &RawRecord) -> Result<(Date, Option<Date>), ValidationError> {
    let period = raw.posting_period.as_deref().map(split_period);

    let start_text = present(raw.posted_from.as_deref()).or(period.as_ref().map(|p| p.start));
    let end_text = present(raw.posted_until.as_deref()).or(period.as_ref().and_then(|p| p.end));

    let start_text = present(start_text).ok_or(ValidationError::MissingField("start_date"))?;
    let start = parse_date(start_text).ok_or_else(|| ValidationError::MalformedDate {
        field: "start_date",
        value: start_text.to_string(),
    })?;

    let end = match present(end_text) {
        Some(text) => Some(parse_date(text).ok_or_else(|| ValidationError::MalformedDate {
            field: "end_date",
            value: text.to_string(),
        })?),
        None => None,
    };

    Ok((start, end))
}

fn present(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !PLACEHOLDERS.contains(v))
}
