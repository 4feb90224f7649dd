//! Paced, retrying HTTP page fetcher.
//!
//! [`PageSource`] is the seam adapters fetch through; [`PageFetcher`] is
//! the real implementation over [`reqwest`]. Tests substitute canned pages.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use legis_core::adapter::AdapterError;
use reqwest::header::{self, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{StatusCode, Url};
use tokio::sync::Mutex;

use crate::backoff::{next_delay, retry_wait};
use crate::config::FetchConfig;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches the body of a page as text.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String, AdapterError>;
}

/// [`PageSource`] over HTTP with pacing, timeout and bounded retries.
pub struct PageFetcher {
    client: reqwest::Client,
    config: FetchConfig,
    last_request: Mutex<Option<Instant>>,
}

/// Why one attempt failed.
#[derive(Debug)]
enum Attempt {
    Transport(reqwest::Error),
    Status(StatusCode),
    Throttled {
        status: StatusCode,
        retry_after: Option<Duration>,
    },
}

impl Attempt {
    fn is_retryable(&self) -> bool {
        match self {
            Attempt::Transport(_) | Attempt::Throttled { .. } => true,
            Attempt::Status(status) => status.is_server_error(),
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Attempt::Throttled { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    fn into_error(self, url: &str) -> AdapterError {
        let url = display_url(url);
        match self {
            Attempt::Transport(e) => AdapterError::Unreachable {
                url,
                reason: e.to_string(),
            },
            Attempt::Status(status) => AdapterError::Unreachable {
                url,
                reason: format!("HTTP {status}"),
            },
            Attempt::Throttled { retry_after, .. } => AdapterError::RateLimited { url, retry_after },
        }
    }
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attempt::Transport(e) => write!(f, "{e}"),
            Attempt::Status(status) | Attempt::Throttled { status, .. } => write!(f, "HTTP {status}"),
        }
    }
}

impl PageFetcher {
    /// Create a fetcher with a browser-like client.
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.8,en-US;q=0.5,en;q=0.3"),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            last_request: Mutex::new(None),
        })
    }

    /// Wait until at least `request_interval` has passed since the previous
    /// request from this fetcher.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.config.request_interval {
                tokio::time::sleep(self.config.request_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn attempt(&self, url: &str) -> Result<String, Attempt> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Attempt::Transport(e.without_url()))?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_retry_after(v, Utc::now()));
            return Err(Attempt::Throttled {
                status,
                retry_after,
            });
        }
        if !status.is_success() {
            return Err(Attempt::Status(status));
        }

        response
            .text()
            .await
            .map_err(|e| Attempt::Transport(e.without_url()))
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn get_text(&self, url: &str) -> Result<String, AdapterError> {
        let mut delay = self.config.backoff.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.pace().await;

            let failure = match self.attempt(url).await {
                Ok(body) => return Ok(body),
                Err(failure) => failure,
            };

            if attempt > self.config.max_retries || !failure.is_retryable() {
                tracing::warn!(
                    url = %display_url(url),
                    attempt,
                    error = %failure,
                    "Request failed, giving up",
                );
                return Err(failure.into_error(url));
            }

            let wait = retry_wait(delay, failure.retry_after(), &self.config.backoff);
            tracing::warn!(
                url = %display_url(url),
                attempt,
                delay_ms = wait.as_millis() as u64,
                error = %failure,
                "Request failed, retrying",
            );
            tokio::time::sleep(wait).await;
            delay = next_delay(delay, &self.config.backoff);
        }
    }
}

/// `url` with every query value masked. Query strings can carry API keys,
/// so this is the only form of a request URL that reaches logs or errors.
pub fn display_url(url: &str) -> String {
    if !url.contains('?') {
        return url.to_string();
    }
    let Ok(mut parsed) = Url::parse(url) else {
        return url.split('?').next().unwrap_or_default().to_string();
    };

    let names: Vec<String> = parsed.query_pairs().map(|(name, _)| name.into_owned()).collect();
    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(names.iter().map(|name| (name.as_str(), "redacted")));
    parsed.into()
}

/// Parse a `Retry-After` header: delta-seconds or an HTTP date.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
