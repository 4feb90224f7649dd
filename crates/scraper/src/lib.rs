//! Source adapters for the upstream legislative-notice sites.
//!
//! Each adapter owns its own [`PageFetcher`], so pacing and retry state is
//! never shared between sources.

pub mod admin;
pub mod backoff;
pub mod config;
pub mod fetcher;
pub mod html;
pub mod national;

use std::sync::Arc;

use legis_core::adapter::SourceAdapter;
use legis_core::source::Source;

pub use admin::AdminAdapter;
pub use config::ScraperConfig;
pub use fetcher::{PageFetcher, PageSource};
pub use national::NationalAdapter;

/// Build the adapter for one source with a dedicated fetcher.
pub fn build_adapter(
    source: Source,
    config: &ScraperConfig,
) -> Result<Arc<dyn SourceAdapter>, reqwest::Error> {
    let fetcher = PageFetcher::new(&config.fetch)?;
    Ok(match source {
        Source::National => Arc::new(NationalAdapter::new(config.national.clone(), fetcher)),
        Source::Admin => Arc::new(AdminAdapter::new(config.admin.clone(), fetcher)),
    })
}

/// Build adapters for `sources`, in the order given.
pub fn build_adapters(
    sources: &[Source],
    config: &ScraperConfig,
) -> Result<Vec<Arc<dyn SourceAdapter>>, reqwest::Error> {
    sources.iter().map(|&s| build_adapter(s, config)).collect()
}
