//! Alert Engine API Server
//!
//! REST surface over the alert store, lifecycle, analytics and dashboard.

use alert_model::{Clock, SystemClock};
use alerting::{AlertLifecycle, BulkActionCoordinator};
use analytics::{QueryMemo, StatsWindow};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, MethodRouter},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage::AlertStore;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Level;

pub mod dashboard;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod settings;

pub use dashboard::{AlertDashboardService, DashboardView};
pub use error::{ApiError, ErrorBody};
pub use rate_limit::{RateLimitConfig, RateLimitError};
pub use settings::Settings;

use settings::LogSettings;

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<AlertStore>,
    pub lifecycle: Arc<AlertLifecycle>,
    pub bulk: BulkActionCoordinator,
    /// Largest id list accepted by the bulk endpoint
    pub max_bulk_ids: usize,
    pub dashboard: Arc<AlertDashboardService>,
    /// Memo for the alert list endpoint
    pub queries: QueryMemo,
    /// Window used when a request names none
    pub default_window: StatsWindow,
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the engine components over `store`
    pub fn new(store: Arc<AlertStore>, settings: &Settings) -> Self {
        let lifecycle = Arc::new(AlertLifecycle::new(
            Arc::clone(&store),
            settings.lifecycle.clone(),
        ));
        Self {
            bulk: BulkActionCoordinator::new(Arc::clone(&lifecycle))
                .with_max_in_flight(settings.bulk.max_in_flight),
            max_bulk_ids: settings.bulk.max_ids,
            dashboard: Arc::new(AlertDashboardService::new(Arc::clone(&store))),
            lifecycle,
            store,
            queries: QueryMemo::new(),
            default_window: settings.dashboard.window,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    /// Fresh in-memory store on the system clock
    pub fn in_memory(settings: &Settings) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::new(Arc::new(AlertStore::with_clock(clock)), settings)
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub alert_count: usize,
    pub store_version: u64,
}

/// Create the application router
///
/// Mutating routes sit behind the per-IP rate limiter when one is configured.
/// Every route except bulk is answered with 408 after the request timeout.
pub fn create_router(state: Arc<AppState>, settings: &Settings) -> Result<Router, RateLimitError> {
    let governor = rate_limit::mutation_governor(&settings.rate_limit)?;
    let limited = |route: MethodRouter<Arc<AppState>>| match &governor {
        Some(layer) => route.layer(layer.clone()),
        None => route,
    };

    let router = Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/api/v1/alerts",
            limited(post(routes::alerts::create_alert)).get(routes::alerts::list_alerts),
        )
        .route(
            "/api/v1/alerts/statistics",
            get(routes::reports::get_statistics),
        )
        .route("/api/v1/alerts/:id", get(routes::alerts::get_alert))
        .route(
            "/api/v1/alerts/:id/acknowledge",
            limited(post(routes::alerts::acknowledge)),
        )
        .route(
            "/api/v1/alerts/:id/resolve",
            limited(post(routes::alerts::resolve)),
        )
        .route(
            "/api/v1/alerts/:id/escalate",
            limited(post(routes::alerts::escalate)),
        )
        .route(
            "/api/v1/alerts/:id/false-positive",
            limited(post(routes::alerts::mark_false_positive)),
        )
        .route(
            "/api/v1/alerts/:id/assign",
            limited(post(routes::alerts::assign)),
        )
        .route("/api/v1/dashboard", get(routes::reports::get_dashboard))
        .layer(TimeoutLayer::new(Duration::from_secs(
            settings.server.request_timeout_secs,
        )))
        .route("/api/v1/alerts/bulk", limited(post(routes::alerts::bulk)))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

/// Health check handler
async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        alert_count: state.store.len()?,
        store_version: state.store.version()?,
    }))
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "metrics exporter not installed".to_string(),
        ),
    }
}

/// Initialize logging
pub fn init_logging(
    settings: &LogSettings,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level: Level = settings.level.parse()?;
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true);

    if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}
