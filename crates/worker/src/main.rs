//! Standalone collector: runs refresh cycles without the HTTP server.
//!
//! Writes straight to the store the API reads from, so a cron job or a
//! systemd timer can keep the data current on its own.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use legis_core::reconcile::{retention_period, DEFAULT_RETENTION_DAYS, MAX_RETENTION_DAYS};
use legis_core::source::Source;
use legis_db::{LegislationStore, MemoryLegislationStore, PgLegislationStore};
use legis_pipeline::{RefreshOrchestrator, RefreshReport};
use legis_scraper::ScraperConfig;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "legis-worker")]
#[command(about = "Collects legislative notices into the notice store", long_about = None)]
struct Cli {
    /// Which sources to collect
    #[arg(long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Repeat every N seconds instead of running once
    #[arg(long, env = "REFRESH_INTERVAL_SECS")]
    interval_secs: Option<u64>,

    /// Only collect notices posted this many days before today
    #[arg(long, env = "NOTICE_LOOKBACK_DAYS")]
    lookback_days: Option<u64>,

    /// Notices first stored longer ago are not reactivated
    #[arg(long, env = "RETENTION_DAYS", default_value_t = DEFAULT_RETENTION_DAYS)]
    retention_days: i64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    All,
    National,
    Admin,
}

impl Mode {
    fn sources(self) -> Vec<Source> {
        match self {
            Mode::All => Source::ALL.to_vec(),
            Mode::National => vec![Source::National],
            Mode::Admin => vec![Source::Admin],
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "legis_worker=debug,legis_pipeline=debug,legis_scraper=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let sources = cli.mode.sources();
    let retention = retention_period(cli.retention_days).with_context(|| {
        format!("retention must be between 1 and {MAX_RETENTION_DAYS} days, got {}", cli.retention_days)
    })?;
    tracing::info!(mode = ?cli.mode, interval_secs = ?cli.interval_secs, "Worker starting");

    let store = connect_store().await?;
    let scraper_config = ScraperConfig::from_env();
    let adapters = legis_scraper::build_adapters(&sources, &scraper_config)
        .context("failed to build source adapters")?;
    let mut orchestrator = RefreshOrchestrator::new(store, adapters).with_retention(retention);
    if let Some(days) = cli.lookback_days {
        orchestrator = orchestrator.with_lookback_days(days);
    }
    let orchestrator = Arc::new(orchestrator);

    match cli.interval_secs.filter(|&secs| secs > 0) {
        None => {
            let report = orchestrator.refresh(&sources).await?;
            log_report(&report);
        }
        Some(secs) => run_every(&orchestrator, &sources, Duration::from_secs(secs)).await,
    }

    tracing::info!("Worker finished");
    Ok(())
}

/// Run cycles on a fixed period until Ctrl-C. A failed cycle is logged and
/// the next tick tries again.
async fn run_every(orchestrator: &Arc<RefreshOrchestrator>, sources: &[Source], period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT (Ctrl-C), stopping");
                break;
            }
            _ = interval.tick() => {
                match orchestrator.refresh(sources).await {
                    Ok(report) => log_report(&report),
                    Err(e) => tracing::error!(error = %e, "Refresh cycle failed"),
                }
            }
        }
    }
}

fn log_report(report: &RefreshReport) {
    for source in &report.sources {
        tracing::info!(
            source = %source.source,
            fetched = source.fetched,
            inserted = source.inserted,
            updated = source.updated,
            unchanged = source.unchanged,
            rejected = source.rejected,
            skipped = source.skipped,
            withdrawn = source.withdrawn,
            error = source.error.as_deref().unwrap_or(""),
            "Source collected"
        );
    }

    let failed = report.failed_sources();
    if failed.is_empty() {
        tracing::info!(
            total_count = report.total_count(),
            expired = report.expired,
            "Refresh completed"
        );
    } else {
        tracing::warn!(
            total_count = report.total_count(),
            failed_sources = ?failed,
            "Refresh completed with failed sources"
        );
    }
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise an in-memory store
/// (a dry run: results are only logged).
async fn connect_store() -> Result<Arc<dyn LegislationStore>> {
    let Some(database_url) = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()) else {
        tracing::warn!("DATABASE_URL not set, collecting into an in-memory store (dry run)");
        return Ok(Arc::new(MemoryLegislationStore::new()));
    };

    let pool = legis_db::create_pool(&database_url)
        .await
        .context("failed to connect to database")?;
    legis_db::run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("Database ready");

    Ok(Arc::new(PgLegislationStore::new(pool)))
}
