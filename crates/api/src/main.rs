use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use legis_core::source::Source;
use legis_db::{LegislationStore, MemoryLegislationStore, PgLegislationStore};
use legis_pipeline::RefreshOrchestrator;
use legis_scraper::ScraperConfig;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legis_api::background;
use legis_api::config::ServerConfig;
use legis_api::routes;
use legis_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "legis_api=debug,legis_pipeline=debug,legis_scraper=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        refresh_interval_secs = ?config.refresh_interval_secs,
        lookback_days = ?config.lookback_days,
        retention_days = config.retention.num_days(),
        "Loaded server configuration"
    );

    let store = connect_store().await;

    let scraper_config = ScraperConfig::from_env();
    let adapters = legis_scraper::build_adapters(&Source::ALL, &scraper_config)
        .expect("Failed to build source adapters");
    tracing::info!(
        adapters = adapters.len(),
        api_key = scraper_config.national.api_key.is_some(),
        "Source adapters ready"
    );

    let mut orchestrator =
        RefreshOrchestrator::new(Arc::clone(&store), adapters).with_retention(config.retention);
    if let Some(days) = config.lookback_days {
        orchestrator = orchestrator.with_lookback_days(days);
    }
    let orchestrator = Arc::new(orchestrator);

    // --- Background tasks ---
    let cancel = CancellationToken::new();

    let retention_handle = tokio::spawn(background::retention::run(
        Arc::clone(&store),
        config.retention,
        cancel.clone(),
    ));

    let refresh_handle = config.refresh_interval_secs.map(|secs| {
        tokio::spawn(background::scheduled_refresh::run(
            Arc::clone(&orchestrator),
            Duration::from_secs(secs),
            cancel.clone(),
        ))
    });

    let cors = build_cors_layer(&config);
    let request_timeout = Duration::from_secs(config.request_timeout_secs);
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );

    let state = AppState {
        store,
        orchestrator,
        config: Arc::new(config),
    };

    let request_id_header = HeaderName::from_static("x-request-id");

    // Layers run bottom-up on requests: CORS first, panic recovery last.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    if let Some(handle) = refresh_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    tracing::info!("Background tasks stopped");
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise an in-memory store.
async fn connect_store() -> Arc<dyn LegislationStore> {
    let Some(database_url) = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()) else {
        tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
        return Arc::new(MemoryLegislationStore::new());
    };

    let pool = legis_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    legis_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    legis_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    Arc::new(PgLegislationStore::new(pool))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from server configuration.
///
/// `*` allows any origin without credentials. Panics at startup if any
/// explicit origin is invalid.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    layer.allow_origin(origins).allow_credentials(true)
}
