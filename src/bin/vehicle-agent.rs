use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tracing::info;
use vehicle_agent::controller::poller::Poller;
use vehicle_agent::server;
use vehicle_agent::utils::config_loader;
use vehicle_agent::utils::logging;
use vehicle_agent::utils::logging::LogLevel;
use vehicle_agent::vehicle::registry::VehicleRegistry;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "vehicle-agent.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level)?;

    // -------------------------------
    // 2. Create request client
    // -------------------------------

    let client = Client::builder()
        .timeout(Duration::from_secs(service_config.settings.request_timeout_seconds))
        .build()
        .context("failed to build http client")?;

    // -------------------------------
    // 3. Build vehicles through the explicit registry
    // -------------------------------

    let registry = VehicleRegistry::with_defaults()?;
    let vehicles = Arc::new(
        registry
            .create_all(&service_config.vehicles, &client)
            .await
            .context("failed to create vehicles")?,
    );

    // -------------------------------
    // 4. Poll vehicles and serve readings
    // -------------------------------

    let poller = Poller::new(
        vehicles.clone(),
        Duration::from_secs(service_config.settings.poll_interval_seconds),
    );
    let http_server = server::server::start(&service_config.settings, vehicles);

    info!("Service starting...");
    tokio::try_join!(poller.run(), http_server)?;

    Ok(())
}
