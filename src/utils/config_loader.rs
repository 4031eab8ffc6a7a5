use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::loader::file_to_config;
use crate::ServiceConfig;

pub async fn run(config_path: &str) -> Result<ServiceConfig> {
    let config = file_to_config(Path::new(config_path))
        .await
        .with_context(|| format!("invalid config '{}'", config_path))?;
    info!(path = config_path, vehicles = config.vehicles.len(), "config loaded");
    Ok(config)
}
