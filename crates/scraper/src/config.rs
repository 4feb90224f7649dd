use std::time::Duration;

use crate::backoff::BackoffConfig;

pub const DEFAULT_ASSEMBLY_API_URL: &str =
    "https://open.assembly.go.kr/portal/openapi/nknalejkafmvgzmpt";
pub const DEFAULT_NATIONAL_LIST_URL: &str =
    "https://pal.assembly.go.kr/napal/lgsltpa/lgsltpaOngoing/list.do";
pub const DEFAULT_ADMIN_LIST_URL: &str = "https://opinion.lawmaking.go.kr/gcom/ogLmPp";

/// Scraper configuration loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct ScraperConfig {
    pub fetch: FetchConfig,
    pub national: NationalConfig,
    pub admin: AdminConfig,
}

/// HTTP behaviour shared by every adapter's fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Minimum gap between two requests from the same fetcher.
    pub request_interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff: BackoffConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff: BackoffConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NationalConfig {
    /// Open API key. Without one only the web listing is scraped.
    pub api_key: Option<String>,
    pub api_url: String,
    pub list_url: String,
    /// Page cap for both the Open API and the web listing.
    pub max_pages: u32,
}

impl Default for NationalConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_ASSEMBLY_API_URL.into(),
            list_url: DEFAULT_NATIONAL_LIST_URL.into(),
            max_pages: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub list_url: String,
    pub max_pages: u32,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            list_url: DEFAULT_ADMIN_LIST_URL.into(),
            max_pages: 5,
        }
    }
}

impl ScraperConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                  |
    /// |-------------------------------|--------------------------|
    /// | `ASSEMBLY_API_KEY`            | unset (web listing only) |
    /// | `ASSEMBLY_API_URL`            | Open API endpoint        |
    /// | `NATIONAL_LIST_URL`           | National Assembly list   |
    /// | `NATIONAL_MAX_PAGES`          | `10`                     |
    /// | `ADMIN_LIST_URL`              | lawmaking.go.kr list     |
    /// | `ADMIN_MAX_PAGES`             | `5`                      |
    /// | `SCRAPER_REQUEST_INTERVAL_MS` | `500`                    |
    /// | `SCRAPER_TIMEOUT_SECS`        | `30`                     |
    /// | `SCRAPER_MAX_RETRIES`         | `3`                      |
    pub fn from_env() -> Self {
        let api_key = std::env::var("ASSEMBLY_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let api_url =
            std::env::var("ASSEMBLY_API_URL").unwrap_or_else(|_| DEFAULT_ASSEMBLY_API_URL.into());

        let national_list_url =
            std::env::var("NATIONAL_LIST_URL").unwrap_or_else(|_| DEFAULT_NATIONAL_LIST_URL.into());

        let national_max_pages: u32 = std::env::var("NATIONAL_MAX_PAGES")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("NATIONAL_MAX_PAGES must be a valid u32");

        let admin_list_url =
            std::env::var("ADMIN_LIST_URL").unwrap_or_else(|_| DEFAULT_ADMIN_LIST_URL.into());

        let admin_max_pages: u32 = std::env::var("ADMIN_MAX_PAGES")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("ADMIN_MAX_PAGES must be a valid u32");

        let request_interval_ms: u64 = std::env::var("SCRAPER_REQUEST_INTERVAL_MS")
            .unwrap_or_else(|_| "500".into())
            .parse()
            .expect("SCRAPER_REQUEST_INTERVAL_MS must be a valid u64");

        let timeout_secs: u64 = std::env::var("SCRAPER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SCRAPER_TIMEOUT_SECS must be a valid u64");

        let max_retries: u32 = std::env::var("SCRAPER_MAX_RETRIES")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("SCRAPER_MAX_RETRIES must be a valid u32");

        Self {
            fetch: FetchConfig {
                request_interval: Duration::from_millis(request_interval_ms),
                timeout: Duration::from_secs(timeout_secs),
                max_retries,
                backoff: BackoffConfig::default(),
            },
            national: NationalConfig {
                api_key,
                api_url,
                list_url: national_list_url,
                max_pages: national_max_pages,
            },
            admin: AdminConfig {
                list_url: admin_list_url,
                max_pages: admin_max_pages,
            },
        }
    }
}
