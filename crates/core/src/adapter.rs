//! The capability every upstream source implements.

use std::time::Duration;

use async_trait::async_trait;

use crate::legislation::RawRecord;
use crate::source::Source;

/// Why an adapter produced nothing this cycle.
///
/// Scoped to one adapter: the refresh pipeline logs it and carries on with
/// the other sources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// Network, DNS, TLS or non-success HTTP failure.
    #[error("{url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    /// The page no longer has the structure the adapter expects.
    #[error("unexpected page structure at {url}: {reason}")]
    Parse { url: String, reason: String },

    /// The source kept throttling after every retry.
    #[error("{url} is rate limiting requests")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },
}

impl AdapterError {
    /// Short machine-readable kind used in logs and refresh reports.
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::Unreachable { .. } => "unreachable",
            AdapterError::Parse { .. } => "parse_error",
            AdapterError::RateLimited { .. } => "rate_limited",
        }
    }
}

/// Produces the notices currently listed by one upstream site.
///
/// Each call re-fetches from scratch; there is no cursor to resume.
/// Implementations apply their own request pacing and retry policy.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The source every record from this adapter belongs to.
    fn source(&self) -> Source;

    /// Fetch all current listings.
    async fn fetch(&self) -> Result<Vec<RawRecord>, AdapterError>;
}
