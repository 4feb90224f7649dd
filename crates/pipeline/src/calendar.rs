use legis_core::types::Date;

/// Where a refresh cycle gets "today" from.
pub trait Calendar: Send + Sync {
    fn today(&self) -> Date;
}

/// The host's local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCalendar;

impl Calendar for LocalCalendar {
    fn today(&self) -> Date {
        chrono::Local::now().date_naive()
    }
}

/// A fixed date.
impl Calendar for Date {
    fn today(&self) -> Date {
        *self
    }
}
