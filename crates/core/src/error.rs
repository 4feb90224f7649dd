use crate::types::Date;

/// Reasons the normalizer rejects a raw record.
///
/// A rejected record is dropped and counted; it never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("field '{field}' has an unrecognised date '{value}'")]
    MalformedDate { field: &'static str, value: String },

    #[error("end_date {end} is before start_date {start}")]
    EndBeforeStart { start: Date, end: Date },
}
