/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar date without a time zone (posting periods are day-granular).
pub type Date = chrono::NaiveDate;
