//! Alert Engine - Main Entry Point

use analytics::{AlertCriteria, Page};
use anyhow::Context;
use api::{create_router, init_logging, AppState, Settings};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_logging(&settings.log).map_err(|e| anyhow::anyhow!("initializing logging: {}", e))?;

    info!("=== Alert Engine v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;
    let state = Arc::new(AppState::in_memory(&settings).with_metrics(metrics));

    if settings.dashboard.refresh_secs > 0 {
        let (_handle, mut views) = state
            .dashboard
            .spawn_refresh(
                AlertCriteria {
                    active_only: true,
                    ..Default::default()
                },
                settings.dashboard.window,
                Page::default(),
                Duration::from_secs(settings.dashboard.refresh_secs),
            )
            .context("starting dashboard refresh")?;

        tokio::spawn(async move {
            while views.changed().await.is_ok() {
                let view = views.borrow_and_update().clone();
                info!(
                    "Dashboard v{}: {} open alert(s), {} open critical",
                    view.snapshot_version, view.matching, view.statistics.open_critical
                );
            }
        });
    }

    let app = create_router(Arc::clone(&state), &settings)?;
    let listener = tokio::net::TcpListener::bind(&settings.server.addr)
        .await
        .with_context(|| format!("binding {}", settings.server.addr))?;

    info!("Starting API server on {}", settings.server.addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
