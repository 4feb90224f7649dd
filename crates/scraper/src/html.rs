//! Small helpers over [`scraper`] shared by the adapters.
//!
//! Parsed documents are not `Send`, so every function here takes markup
//! text and returns owned values; nothing parsed outlives the call.

use legis_core::adapter::AdapterError;
use legis_core::text::clean;
use reqwest::Url;
use scraper::{ElementRef, Selector};

/// Parse a CSS selector known at compile time.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

/// Visible text of an element, whitespace-collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    clean(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first element matching `sel` under `root`, if any is non-empty.
pub fn first_text(root: ElementRef<'_>, sel: &Selector) -> Option<String> {
    root.select(sel).map(element_text).find(|t| !t.is_empty())
}

/// Resolve `href` against the page it was found on.
///
/// Script and fragment links do not point at a page and yield `None`.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:") {
        return None;
    }
    base.join(href).ok().map(String::from)
}

/// Append query parameters to `base`.
pub fn page_url(base: &str, params: &[(&str, String)]) -> Result<Url, AdapterError> {
    Url::parse_with_params(base, params).map_err(|e| AdapterError::Parse {
        url: base.to_string(),
        reason: format!("invalid URL: {e}"),
    })
}
