use anyhow::{Context, Result};
use axum::Router;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::vehicles::VehiclesState;
use crate::vehicle::VehicleMap;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub vehicles_state: VehiclesState,
}

impl AppState {
    pub fn new(metrics: &Metrics, vehicles: VehicleMap) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            vehicles_state: VehiclesState::new(vehicles),
        }
    }
}

pub fn router(state: AppState, settings_config: &SettingsConfig) -> Router {
    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.vehicles_state.router())
        .with_state(state)
}

/// Serve vehicle readings, charge actions and metrics on one listener.
pub async fn start(settings_config: &SettingsConfig, vehicles: VehicleMap) -> Result<()> {
    let metrics = get_metrics().await;
    let app = router(AppState::new(metrics, vehicles), settings_config);

    let address = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!("http server listening on {}", address);
    metrics.up.set(1);

    axum::serve(listener, app).await.context("http server failed")?;
    Ok(())
}
