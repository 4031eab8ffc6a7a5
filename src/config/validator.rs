//! Configuration validation with aggregated errors.
//! - settings: poll interval, server, metrics path, logging level
//! - vehicles: credentials, cache ttl, capacity, upstream uris

use tracing::{error, info};

use crate::config::settings::SettingsConfig;
use crate::config::vehicles::{ServiceConfig, VehicleConfig};
use crate::observability::metrics::get_metrics;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);

    if cfg.vehicles.is_empty() {
        errors.push("config: 'vehicles' is empty; at least one vehicle required".to_string());
    }

    let mut names: Vec<&String> = cfg.vehicles.keys().collect();
    names.sort();
    for name in names {
        validate_vehicle(name, &cfg.vehicles[name], &mut errors);
    }

    if errors.is_empty() {
        info!("config valid");
        return Ok(());
    }

    error!("configuration validation errors ({}):", errors.len());
    for e in &errors {
        error!(" - {}", e);
    }
    get_metrics().await.config_validation_errors.inc();
    Err(errors)
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.poll_interval_seconds == 0 {
        errors.push("settings.poll_interval_seconds must be > 0".to_string());
    }
    if settings.request_timeout_seconds == 0 {
        errors.push("settings.request_timeout_seconds must be > 0".to_string());
    }

    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be a valid port number",
            settings.server.port
        ));
    }

    if !settings.metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            settings.metrics.path
        ));
    }

    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

/// VEHICLE BASICS
fn validate_vehicle(name: &str, vehicle: &VehicleConfig, errors: &mut Vec<String>) {
    if vehicle.vehicle_type.trim().is_empty() {
        errors.push(format!("vehicles.{}: type must not be empty", name));
    }

    if vehicle.credentials.validate().is_err() {
        errors.push(format!(
            "vehicles.{}: credentials.id and credentials.secret are required",
            name
        ));
    }

    if vehicle.cache_seconds == 0 {
        errors.push(format!("vehicles.{}: cache_seconds must be > 0", name));
    }

    if let Some(capacity) = vehicle.capacity {
        if !(capacity > 0.0) {
            errors.push(format!("vehicles.{}: capacity ({}) must be > 0", name, capacity));
        }
    }

    for (field, uri) in [("api_uri", &vehicle.api_uri), ("token_uri", &vehicle.token_uri)] {
        if let Some(uri) = uri {
            if !(uri.starts_with("http://") || uri.starts_with("https://")) {
                errors.push(format!(
                    "vehicles.{}: {} '{}' must start with http:// or https://",
                    name, field, uri
                ));
            }
        }
    }
}
