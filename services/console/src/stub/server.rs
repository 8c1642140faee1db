use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rental_desk::config::AppConfig;
use rental_desk::error::AppError;
use tracing::info;

use super::infra::{AppState, StubStore, STUB_TOKEN};
use super::routes::stub_router;

/// Serves the contract stub until the process is stopped.
pub async fn run(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), AppError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = stub_router(StubStore::seeded())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        token = STUB_TOKEN,
        "verification contract stub ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
