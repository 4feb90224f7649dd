//! National Assembly legislative notices (입법부 입법예고).
//!
//! Two upstream views of the same notices are combined:
//!
//! - the Open API (`nknalejkafmvgzmpt`), structured but without summaries,
//!   queried only when an API key is configured;
//! - the public listing at `pal.assembly.go.kr`, scraped page by page and
//!   followed into each detail page.
//!
//! API records win per bill number; web records fill in what the API left
//! blank and contribute notices the API does not list.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use legis_core::adapter::{AdapterError, SourceAdapter};
use legis_core::legislation::RawRecord;
use legis_core::source::Source;
use legis_core::text::clean_optional;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use crate::config::NationalConfig;
use crate::fetcher::PageSource;
use crate::html::{element_text, first_text, page_url, resolve_link, selector};

const LIST_PAGE_SIZE: u32 = 20;
const API_PAGE_SIZE: u32 = 100;

/// Minimum length of a summary block on the detail page.
const MIN_SUMMARY_CHARS: usize = 50;
const SUMMARY_MARKERS: &[&str] = &["내용", "요약", "개요"];

static LIST_TABLE: LazyLock<Selector> =
    LazyLock::new(|| selector("#frm > div > div.board01.pr.td_center.board-added > table"));
static LIST_ROW: LazyLock<Selector> = LazyLock::new(|| selector("tbody > tr"));
static LIST_LINK: LazyLock<Selector> = LazyLock::new(|| selector("td.align_left.td_block > a"));

static DETAIL_TITLE: LazyLock<Selector> =
    LazyLock::new(|| selector("h1, h2, h3, .title, .board-title"));
static TABLE_ROW: LazyLock<Selector> = LazyLock::new(|| selector("table tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td, th"));
static DIV: LazyLock<Selector> = LazyLock::new(|| selector("div"));

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

pub struct NationalAdapter<P> {
    config: NationalConfig,
    pages: P,
}

impl<P: PageSource> NationalAdapter<P> {
    pub fn new(config: NationalConfig, pages: P) -> Self {
        Self { config, pages }
    }

    /// All notices the Open API currently lists.
    async fn fetch_api(&self, key: &str) -> Result<Vec<RawRecord>, AdapterError> {
        let mut records = Vec::new();

        for page in 1..=self.config.max_pages {
            let url = api_page_url(&self.config.api_url, key, page)?;
            let body = self
                .pages
                .get_text(url.as_str())
                .await
                .map_err(|e| redact_url(e, &self.config.api_url))?;
            let rows = parse_api_page(&body).map_err(|reason| AdapterError::Parse {
                url: self.config.api_url.clone(),
                reason,
            })?;

            if rows.is_empty() {
                break;
            }
            tracing::debug!(page, rows = rows.len(), "Open API page fetched");
            records.extend(rows);
        }

        Ok(records)
    }

    /// All notices on the public listing, with detail pages followed.
    async fn fetch_web(&self) -> Result<Vec<RawRecord>, AdapterError> {
        let mut links = Vec::new();

        for page in 1..=self.config.max_pages {
            let url = list_page_url(&self.config.list_url, page)?;
            let body = self.pages.get_text(url.as_str()).await?;
            let page_links = parse_list_page(&body, &url)?;

            if page_links.is_empty() {
                tracing::debug!(page, "National listing exhausted");
                break;
            }
            tracing::debug!(page, links = page_links.len(), "National listing page fetched");
            links.extend(page_links);
        }

        let mut records = Vec::with_capacity(links.len());
        for link in &links {
            match self.pages.get_text(link).await {
                Ok(body) => records.push(parse_detail_page(&body, link)),
                Err(e) => {
                    tracing::warn!(url = %link, error = %e, "Skipping national detail page");
                }
            }
        }

        tracing::info!(links = links.len(), records = records.len(), "National listing scraped");
        Ok(records)
    }
}

#[async_trait]
impl<P: PageSource> SourceAdapter for NationalAdapter<P> {
    fn source(&self) -> Source {
        Source::National
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, AdapterError> {
        let api = match self.config.api_key.as_deref() {
            Some(key) => Some(self.fetch_api(key).await),
            None => None,
        };
        let web = self.fetch_web().await;

        match (api, web) {
            (None, web) => web,
            (Some(Ok(api)), Ok(web)) => Ok(merge(api, web)),
            (Some(Ok(api)), Err(e)) => {
                tracing::warn!(error = %e, "National listing failed, using Open API records only");
                Ok(api)
            }
            (Some(Err(e)), Ok(web)) => {
                tracing::warn!(error = %e, "Open API failed, using national listing only");
                Ok(web)
            }
            (Some(Err(api_err)), Err(web_err)) => {
                tracing::warn!(error = %api_err, "Open API failed");
                Err(web_err)
            }
        }
    }
}

/// Replace the request URL in an error with the key-free endpoint.
fn redact_url(err: AdapterError, endpoint: &str) -> AdapterError {
    let url = endpoint.to_string();
    match err {
        AdapterError::Unreachable { reason, .. } => AdapterError::Unreachable { url, reason },
        AdapterError::Parse { reason, .. } => AdapterError::Parse { url, reason },
        AdapterError::RateLimited { retry_after, .. } => AdapterError::RateLimited { url, retry_after },
    }
}

// ---------------------------------------------------------------------------
// Open API
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    /// `[{"head": …}, {"row": […]}]`; absent when there are no results.
    #[serde(rename = "nknalejkafmvgzmpt", default)]
    sections: Vec<ApiSection>,
}

#[derive(Debug, Deserialize)]
struct ApiSection {
    #[serde(default)]
    row: Vec<ApiRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct ApiRow {
    bill_no: Option<String>,
    bill_name: Option<String>,
    link_url: Option<String>,
    curr_committee: Option<String>,
    proposer: Option<String>,
    noti_st_dt: Option<String>,
    noti_ed_dt: Option<String>,
}

impl From<ApiRow> for RawRecord {
    fn from(row: ApiRow) -> Self {
        RawRecord {
            bill_no: row.bill_no,
            title: row.bill_name,
            committee: row.curr_committee,
            proposer: row.proposer,
            posted_from: row.noti_st_dt,
            posted_until: row.noti_ed_dt,
            posting_period: None,
            content: None,
            link_url: row.link_url,
        }
    }
}

pub fn api_page_url(endpoint: &str, key: &str, page: u32) -> Result<Url, AdapterError> {
    page_url(
        endpoint,
        &[
            ("KEY", key.to_string()),
            ("Type", "json".into()),
            ("pIndex", page.to_string()),
            ("pSize", API_PAGE_SIZE.to_string()),
        ],
    )
}

/// Rows of one Open API page. An empty result set parses to no rows.
pub fn parse_api_page(body: &str) -> Result<Vec<RawRecord>, String> {
    let envelope: ApiEnvelope =
        serde_json::from_str(body).map_err(|e| format!("invalid Open API response: {e}"))?;
    Ok(envelope
        .sections
        .into_iter()
        .flat_map(|s| s.row)
        .map(RawRecord::from)
        .collect())
}

// ---------------------------------------------------------------------------
// Web listing
// ---------------------------------------------------------------------------

pub fn list_page_url(list_url: &str, page: u32) -> Result<Url, AdapterError> {
    page_url(
        list_url,
        &[
            ("searchConClosed", "0".into()),
            ("menuNo", "1100026".into()),
            ("pIndex", page.to_string()),
            ("pSize", LIST_PAGE_SIZE.to_string()),
        ],
    )
}

/// Detail links on one listing page.
///
/// A page without the listing table means the markup changed; a table
/// without linked rows means the listing is exhausted.
pub fn parse_list_page(body: &str, page: &Url) -> Result<Vec<String>, AdapterError> {
    let doc = Html::parse_document(body);
    let table = doc.select(&LIST_TABLE).next().ok_or_else(|| AdapterError::Parse {
        url: page.to_string(),
        reason: "listing table not found".into(),
    })?;

    Ok(table
        .select(&LIST_ROW)
        .filter_map(|row| row.select(&LIST_LINK).next())
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(page, href))
        .collect())
}

/// Extract a notice from a detail page. Fields the page lacks stay `None`.
pub fn parse_detail_page(body: &str, url: &str) -> RawRecord {
    let doc = Html::parse_document(body);
    let root = doc.root_element();

    let mut record = RawRecord {
        title: first_text(root, &DETAIL_TITLE),
        link_url: Some(url.to_string()),
        ..RawRecord::default()
    };

    for row in root.select(&TABLE_ROW) {
        let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
        if cells.len() < 2 {
            continue;
        }
        let label = element_text(cells[0]);
        let value = Some(element_text(cells[1])).filter(|v| !v.is_empty());

        let slot = if label.contains("의안번호") || label.contains("안건번호") {
            &mut record.bill_no
        } else if label.contains("제안자") || label.contains("발의자") {
            &mut record.proposer
        } else if label.contains("소관위") || label.contains("위원회") {
            &mut record.committee
        } else if label.contains("게시") && label.contains("기간") {
            &mut record.posting_period
        } else {
            continue;
        };
        if slot.is_none() {
            *slot = value;
        }
    }

    record.content = summary_block(root);
    record
}

/// The innermost `div` that looks like the notice summary.
fn summary_block(root: ElementRef<'_>) -> Option<String> {
    let is_summary = |text: &str| {
        text.chars().count() > MIN_SUMMARY_CHARS && SUMMARY_MARKERS.iter().any(|m| text.contains(m))
    };

    root.select(&DIV)
        .filter(|div| is_summary(&element_text(*div)))
        .find(|div| !div.select(&DIV).any(|inner| is_summary(&element_text(inner))))
        .map(element_text)
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Combine Open API and web records. API records come first and win per
/// bill number; matching web records only fill blank fields.
pub fn merge(api: Vec<RawRecord>, web: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut merged = api;
    let index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .filter_map(|(i, r)| bill_key(r).map(|k| (k, i)))
        .collect();

    for record in web {
        match bill_key(&record).and_then(|k| index.get(&k).copied()) {
            Some(i) => fill_blanks(&mut merged[i], record),
            None => merged.push(record),
        }
    }

    merged
}

fn bill_key(record: &RawRecord) -> Option<String> {
    clean_optional(record.bill_no.as_deref())
}

fn fill_blanks(target: &mut RawRecord, from: RawRecord) {
    fn fill(slot: &mut Option<String>, value: Option<String>) {
        if clean_optional(slot.as_deref()).is_none() {
            *slot = value;
        }
    }

    fill(&mut target.content, from.content);
    fill(&mut target.proposer, from.proposer);
    fill(&mut target.posted_from, from.posted_from);
    fill(&mut target.posted_until, from.posted_until);
    fill(&mut target.posting_period, from.posting_period);
    fill(&mut target.link_url, from.link_url);
}
