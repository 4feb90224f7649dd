#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use chrono::TimeDelta;
use legis_core::adapter::{AdapterError, SourceAdapter};
use legis_core::legislation::{LegislationItem, RawRecord, StoredLegislation};
use legis_core::reconcile::{Liveness, ReconcileDecision};
use legis_core::source::Source;
use legis_core::types::{Date, Timestamp};
use legis_db::models::legislation::{LegislationStatistics, ListFilter};
use legis_db::{LegislationStore, MemoryLegislationStore, StoreError};
use legis_pipeline::RefreshOrchestrator;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use legis_api::config::ServerConfig;
use legis_api::routes;
use legis_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        request_timeout_secs: 30,
        refresh_interval_secs: None,
        retention: TimeDelta::days(30),
        lookback_days: None,
    }
}

/// Adapter that returns whatever the test last scripted.
pub struct ScriptedAdapter {
    source: Source,
    response: Mutex<Result<Vec<RawRecord>, AdapterError>>,
}

impl ScriptedAdapter {
    pub fn new(source: Source, records: Vec<RawRecord>) -> Arc<Self> {
        Arc::new(Self {
            source,
            response: Mutex::new(Ok(records)),
        })
    }

    pub fn failing(source: Source) -> Arc<Self> {
        Arc::new(Self {
            source,
            response: Mutex::new(Err(AdapterError::Unreachable {
                url: "https://upstream.test".into(),
                reason: "connection refused".into(),
            })),
        })
    }

    pub fn set(&self, records: Vec<RawRecord>) {
        *self.response.lock().unwrap() = Ok(records);
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, AdapterError> {
        self.response.lock().unwrap().clone()
    }
}

pub fn national_record(bill_no: &str, title: &str, end: &str) -> RawRecord {
    RawRecord {
        bill_no: Some(bill_no.into()),
        title: Some(title.into()),
        committee: Some("법제사법위원회".into()),
        proposer: Some("홍길동의원 등 10인".into()),
        posted_from: Some("2024-01-01".into()),
        posted_until: Some(end.into()),
        content: Some("제안이유 및 주요내용".into()),
        link_url: Some(format!("https://pal.assembly.go.kr/bill/{bill_no}")),
        ..RawRecord::default()
    }
}

pub fn admin_record(title: &str) -> RawRecord {
    RawRecord {
        title: Some(title.into()),
        committee: Some("국토교통부 주택정책과".into()),
        posting_period: Some("2024. 1. 1. ~ 2024. 2. 1.".into()),
        ..RawRecord::default()
    }
}

/// Memory store that reports a write conflict for notices titled
/// `conflict_title`, as if a concurrent writer had inserted them first.
pub struct ConflictingStore {
    pub inner: MemoryLegislationStore,
    pub conflict_title: &'static str,
}

#[async_trait]
impl LegislationStore for ConflictingStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
    async fn find(&self, source: Source, id: &str) -> Result<Option<StoredLegislation>, StoreError> {
        self.inner.find(source, id).await
    }
    async fn reconcile(
        &self,
        candidate: &LegislationItem,
        liveness: &Liveness,
        now: Timestamp,
    ) -> Result<ReconcileDecision, StoreError> {
        if candidate.title == self.conflict_title {
            return Err(StoreError::Conflict {
                source: candidate.source,
                id: candidate.id.clone(),
            });
        }
        self.inner.reconcile(candidate, liveness, now).await
    }
    async fn list(&self, filter: &ListFilter) -> Result<Vec<StoredLegislation>, StoreError> {
        self.inner.list(filter).await
    }
    async fn count(&self, filter: &ListFilter) -> Result<i64, StoreError> {
        self.inner.count(filter).await
    }
    async fn search(
        &self,
        keyword: &str,
        source: Option<Source>,
    ) -> Result<Vec<StoredLegislation>, StoreError> {
        self.inner.search(keyword, source).await
    }
    async fn recent(&self, since: Timestamp) -> Result<Vec<StoredLegislation>, StoreError> {
        self.inner.recent(since).await
    }
    async fn statistics(&self) -> Result<LegislationStatistics, StoreError> {
        self.inner.statistics().await
    }
    async fn find_by_link_url(
        &self,
        source: Source,
        link_url: &str,
    ) -> Result<Vec<StoredLegislation>, StoreError> {
        self.inner.find_by_link_url(source, link_url).await
    }
    async fn deactivate_unseen(
        &self,
        source: Source,
        since: Date,
        seen: &[String],
        now: Timestamp,
    ) -> Result<u64, StoreError> {
        self.inner.deactivate_unseen(source, since, seen, now).await
    }
    async fn deactivate_expired(&self, today: Date, now: Timestamp) -> Result<u64, StoreError> {
        self.inner.deactivate_expired(today, now).await
    }
    async fn deactivate_created_before(
        &self,
        cutoff: Timestamp,
        now: Timestamp,
    ) -> Result<u64, StoreError> {
        self.inner.deactivate_created_before(cutoff, now).await
    }
}

/// Everything a test needs to drive and inspect the app.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryLegislationStore>,
    pub orchestrator: Arc<RefreshOrchestrator>,
}

/// Build the full application over a memory store and `adapters`.
pub fn build_test_app_with(
    store: Arc<MemoryLegislationStore>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
) -> TestApp {
    let (router, orchestrator) = build_router(store.clone(), adapters);
    TestApp {
        router,
        store,
        orchestrator,
    }
}

/// Build the application router over any store.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack. The refresh calendar is pinned to
/// 2024-01-02 so the fixture notices are still open.
pub fn build_router(
    store: Arc<dyn LegislationStore>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
) -> (Router, Arc<RefreshOrchestrator>) {
    let config = test_config();
    let today = Date::from_ymd_opt(2024, 1, 2).unwrap();

    let orchestrator = Arc::new(
        RefreshOrchestrator::new(Arc::clone(&store), adapters)
            .with_calendar(Arc::new(today))
            .with_retention(config.retention),
    );

    let state = AppState {
        store,
        orchestrator: Arc::clone(&orchestrator),
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
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

    (router, orchestrator)
}

/// An app over an empty store with one scripted adapter per source.
pub fn build_test_app() -> (TestApp, Arc<ScriptedAdapter>, Arc<ScriptedAdapter>) {
    let national = ScriptedAdapter::new(
        Source::National,
        vec![
            national_record("2201001", "도로교통법 일부개정법률안", "2024-01-10"),
            national_record("2201002", "주택법 일부개정법률안", "2024-01-12"),
        ],
    );
    let admin = ScriptedAdapter::new(Source::Admin, vec![admin_record("건축법 시행령 일부개정령안")]);
    let app = build_test_app_with(
        Arc::new(MemoryLegislationStore::new()),
        vec![national.clone(), admin.clone()],
    );
    (app, national, admin)
}

/// Send a GET request to `uri`.
pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

/// Send a bodiless POST request to `uri`.
pub async fn post(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri).await
}

async fn send(app: &Router, method: Method, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
