use chrono::TimeDelta;
use legis_core::reconcile::{retention_period, DEFAULT_RETENTION_DAYS, MAX_RETENTION_DAYS};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `7050`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    /// A single `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`, a full refresh
    /// crawls both sites inside one request).
    pub request_timeout_secs: u64,
    /// Scheduled refresh period. `None` disables the scheduler.
    pub refresh_interval_secs: Option<u64>,
    /// Notices first stored longer ago than this are deactivated and no
    /// longer reactivated by a refresh.
    pub retention: TimeDelta,
    /// Narrow each refresh to notices posted this many days before today.
    /// `None` reconciles everything the adapters return.
    pub lookback_days: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default   |
    /// |-------------------------|-----------|
    /// | `HOST`                  | `0.0.0.0` |
    /// | `PORT`                  | `7050`    |
    /// | `CORS_ORIGINS`          | `*`       |
    /// | `REQUEST_TIMEOUT_SECS`  | `300`     |
    /// | `REFRESH_INTERVAL_SECS` | unset     |
    /// | `RETENTION_DAYS`        | `30`      |
    /// | `NOTICE_LOOKBACK_DAYS`  | unset     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "7050".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let refresh_interval_secs: Option<u64> = std::env::var("REFRESH_INTERVAL_SECS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| {
                v.trim()
                    .parse()
                    .expect("REFRESH_INTERVAL_SECS must be a valid u64")
            })
            .filter(|&secs| secs > 0);

        let retention_days: i64 = std::env::var("RETENTION_DAYS")
            .unwrap_or_else(|_| DEFAULT_RETENTION_DAYS.to_string())
            .parse()
            .expect("RETENTION_DAYS must be a valid i64");
        let retention = retention_period(retention_days).unwrap_or_else(|| {
            panic!("RETENTION_DAYS must be between 1 and {MAX_RETENTION_DAYS}, got {retention_days}")
        });

        let lookback_days: Option<u64> = std::env::var("NOTICE_LOOKBACK_DAYS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| {
                v.trim()
                    .parse()
                    .expect("NOTICE_LOOKBACK_DAYS must be a valid u64")
            });

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            refresh_interval_secs,
            retention,
            lookback_days,
        }
    }

    /// Whether `CORS_ORIGINS` allows every origin.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}
