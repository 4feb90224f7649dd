use legis_core::source::Source;

/// Failure of a store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Another writer inserted the same `(source, id)` between our read and
    /// our insert. The row is left as the other writer stored it.
    #[error("Concurrent insert of {source}/{id}")]
    Conflict { r#source: Source, id: String },

    /// A stored row could not be mapped back to a notice.
    #[error("Corrupt row {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
