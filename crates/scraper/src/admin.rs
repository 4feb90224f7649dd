//! Administrative-agency legislative notices (행정부 입법예고) from
//! `opinion.lawmaking.go.kr`.

use std::sync::LazyLock;

use async_trait::async_trait;
use legis_core::adapter::{AdapterError, SourceAdapter};
use legis_core::legislation::RawRecord;
use legis_core::source::Source;
use reqwest::Url;
use scraper::{Html, Selector};

use crate::config::AdminConfig;
use crate::fetcher::PageSource;
use crate::html::{element_text, first_text, page_url, resolve_link, selector};

const LIST_PAGE_SIZE: u32 = 20;

/// Headings that start the opinion-submission part of a notice body.
const OPINION_MARKERS: &[&str] = &["3. 의견제출", "의견제출", "※ 제출의견", "의견 제출"];

static LIST_VIEW: LazyLock<Selector> = LazyLock::new(|| selector("#listView"));
static LIST_LINK: LazyLock<Selector> = LazyLock::new(|| selector("ul > li.title.W40 > a"));

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| selector("#ogLmPpVo span, .title span, h1, h2, h3"));
static TITLE_FALLBACK: LazyLock<Selector> = LazyLock::new(|| selector("p span, div span"));
static COMMITTEE: LazyLock<Selector> =
    LazyLock::new(|| selector("ul.basic li table tbody tr td, .basic li table td"));
static PERIOD: LazyLock<Selector> =
    LazyLock::new(|| selector("ul.basic li:first-child, .basic li:first-child"));
static CONTENT: LazyLock<Selector> =
    LazyLock::new(|| selector("#ogLmPpVo > div:nth-child(7) > div"));
static ATTACHMENT: LazyLock<Selector> =
    LazyLock::new(|| selector("#ogLmPpVo > ul:nth-child(2) > a:nth-child(2)"));

pub struct AdminAdapter<P> {
    config: AdminConfig,
    pages: P,
}

impl<P: PageSource> AdminAdapter<P> {
    pub fn new(config: AdminConfig, pages: P) -> Self {
        Self { config, pages }
    }
}

#[async_trait]
impl<P: PageSource> SourceAdapter for AdminAdapter<P> {
    fn source(&self) -> Source {
        Source::Admin
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, AdapterError> {
        let mut records = Vec::new();

        for page in 1..=self.config.max_pages {
            let url = list_page_url(&self.config.list_url, page)?;
            let body = self.pages.get_text(url.as_str()).await?;
            let links = parse_list_page(&body, &url)?;

            if links.is_empty() {
                tracing::debug!(page, "Admin listing exhausted");
                break;
            }

            for link in &links {
                match self.pages.get_text(link).await {
                    Ok(body) => records.push(parse_detail_page(&body, link)),
                    Err(e) => {
                        tracing::warn!(url = %link, error = %e, "Skipping admin detail page");
                    }
                }
            }
            tracing::debug!(page, links = links.len(), "Admin listing page scraped");
        }

        tracing::info!(records = records.len(), "Admin listing scraped");
        Ok(records)
    }
}

pub fn list_page_url(list_url: &str, page: u32) -> Result<Url, AdapterError> {
    page_url(
        list_url,
        &[
            ("pIndex", page.to_string()),
            ("pSize", LIST_PAGE_SIZE.to_string()),
        ],
    )
}

/// Detail links on one listing page.
pub fn parse_list_page(body: &str, page: &Url) -> Result<Vec<String>, AdapterError> {
    let doc = Html::parse_document(body);
    let list = doc.select(&LIST_VIEW).next().ok_or_else(|| AdapterError::Parse {
        url: page.to_string(),
        reason: "#listView not found".into(),
    })?;

    Ok(list
        .select(&LIST_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(page, href))
        .collect())
}

/// Extract a notice from a detail page. Fields the page lacks stay `None`.
pub fn parse_detail_page(body: &str, url: &str) -> RawRecord {
    let doc = Html::parse_document(body);
    let root = doc.root_element();

    let title = first_text(root, &TITLE).or_else(|| first_text(root, &TITLE_FALLBACK));

    let committee = first_text(root, &COMMITTEE).map(|text| match text.split_once("전화번호") {
        Some((before, _)) => before.trim().to_string(),
        None => text,
    });

    let content = root
        .select(&CONTENT)
        .next()
        .map(|el| cut_before_opinion(&element_text(el)).to_string());

    let link_url = Url::parse(url)
        .ok()
        .and_then(|base| {
            root.select(&ATTACHMENT)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve_link(&base, href))
        })
        .unwrap_or_else(|| url.to_string());

    RawRecord {
        title,
        committee,
        posting_period: first_text(root, &PERIOD),
        content,
        link_url: Some(link_url),
        ..RawRecord::default()
    }
}

/// Drop the opinion-submission instructions that trail the notice body.
pub fn cut_before_opinion(text: &str) -> &str {
    OPINION_MARKERS
        .iter()
        .find_map(|marker| text.split_once(marker).map(|(before, _)| before))
        .unwrap_or(text)
        .trim()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    const LIST_URL: &str = "https://opinion.lawmaking.go.kr/gcom/ogLmPp";

    fn list_html(hrefs: &[&str]) -> String {
        let items: String = hrefs
            .iter()
            .map(|h| format!(r#"<ul><li class="title W40"><a href="{h}">notice</a></li></ul>"#))
            .collect();
        format!(r#"<html><body><div id="listView">{items}</div></body></html>"#)
    }

    const DETAIL_HTML: &str = r#"
        <html><body>
          <div id="ogLmPpVo">
            <p><span>「건축법 시행령」 일부개정령(안) 입법예고</span></p>
            <ul><a href="/gcom/print">인쇄</a><a href="/gcom/file/123">첨부파일</a></ul>
            <ul class="basic">
              <li>입법예고기간 : 2024. 3. 4. ~ 2024. 4. 15.</li>
              <li><table><tbody><tr><td>국토교통부 건축정책과 전화번호 044-201-0000</td></tr></tbody></table></li>
            </ul>
            <div>a</div><div>b</div><div>c</div>
            <div><div>1. 개정이유 건축물 안전 기준 정비. 2. 주요내용 내진 설계 대상 확대. 3. 의견제출 누구든지 의견을 제출할 수 있습니다.</div></div>
          </div>
        </body></html>"#;

    struct StaticPages(HashMap<String, String>);

    #[async_trait]
    impl PageSource for StaticPages {
        async fn get_text(&self, url: &str) -> Result<String, AdapterError> {
            self.0.get(url).cloned().ok_or_else(|| AdapterError::Unreachable {
                url: url.into(),
                reason: "HTTP 404 Not Found".into(),
            })
        }
    }

    #[test]
    fn cuts_opinion_section() {
        assert_eq!(cut_before_opinion("body text 3. 의견제출 how to"), "body text");
        assert_eq!(cut_before_opinion("body ※ 제출의견 x"), "body");
        assert_eq!(cut_before_opinion(" plain "), "plain");
    }

    #[test]
    fn parses_detail_page() {
        let url = "https://opinion.lawmaking.go.kr/gcom/ogLmPp/123";
        let record = parse_detail_page(DETAIL_HTML, url);

        assert_eq!(
            record.title.as_deref(),
            Some("「건축법 시행령」 일부개정령(안) 입법예고")
        );
        assert_eq!(record.committee.as_deref(), Some("국토교통부 건축정책과"));
        assert_eq!(
            record.posting_period.as_deref(),
            Some("입법예고기간 : 2024. 3. 4. ~ 2024. 4. 15.")
        );
        assert_eq!(
            record.content.as_deref(),
            Some("1. 개정이유 건축물 안전 기준 정비. 2. 주요내용 내진 설계 대상 확대.")
        );
        assert_eq!(
            record.link_url.as_deref(),
            Some("https://opinion.lawmaking.go.kr/gcom/file/123")
        );
    }

    #[test]
    fn link_falls_back_to_detail_url() {
        let url = "https://opinion.lawmaking.go.kr/gcom/ogLmPp/9";
        let record = parse_detail_page("<html><body><h2>T</h2></body></html>", url);
        assert_eq!(record.title.as_deref(), Some("T"));
        assert_eq!(record.committee, None);
        assert_eq!(record.link_url.as_deref(), Some(url));
    }

    #[test]
    fn missing_list_view_is_a_parse_error() {
        let page = list_page_url(LIST_URL, 1).unwrap();
        assert_matches!(
            parse_list_page("<html></html>", &page),
            Err(AdapterError::Parse { .. })
        );
    }

    #[tokio::test]
    async fn fetch_follows_every_listed_notice() {
        let page = |n| list_page_url(LIST_URL, n).unwrap().to_string();
        let pages = StaticPages(HashMap::from([
            (page(1), list_html(&["/gcom/ogLmPp/123", "/gcom/ogLmPp/124"])),
            (page(2), list_html(&[])),
            (
                "https://opinion.lawmaking.go.kr/gcom/ogLmPp/123".to_string(),
                DETAIL_HTML.to_string(),
            ),
            (
                "https://opinion.lawmaking.go.kr/gcom/ogLmPp/124".to_string(),
                DETAIL_HTML.to_string(),
            ),
        ]));

        let adapter = AdminAdapter::new(
            AdminConfig {
                list_url: LIST_URL.into(),
                max_pages: 5,
            },
            pages,
        );
        let records = adapter.fetch().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.committee.as_deref() == Some("국토교통부 건축정책과")));
    }

    #[tokio::test]
    async fn page_cap_is_respected() {
        let page = |n| list_page_url(LIST_URL, n).unwrap().to_string();
        let pages = StaticPages(HashMap::from([
            (page(1), list_html(&["/gcom/ogLmPp/123"])),
            ("https://opinion.lawmaking.go.kr/gcom/ogLmPp/123".to_string(), DETAIL_HTML.to_string()),
        ]));

        let adapter = AdminAdapter::new(
            AdminConfig {
                list_url: LIST_URL.into(),
                max_pages: 1,
            },
            pages,
        );
        assert_eq!(adapter.fetch().await.unwrap().len(), 1);
    }
}
