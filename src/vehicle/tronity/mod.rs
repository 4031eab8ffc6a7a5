//! Tronity cloud adapter.
//!
//! The vehicle id is resolved once at construction. All typed reads go
//! through one [`CachedBulk`] over the bulk endpoint, so state of charge,
//! range and status requested within the same ttl window cost one upstream
//! call.

pub mod api;

use async_trait::async_trait;
use futures::future::BoxFuture;
use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::provider::TokenProvider;
use crate::auth::transport::AuthorizedClient;
use crate::cache::cached_bulk::{BulkSource, CachedBulk};
use crate::config::vehicles::VehicleConfig;
use crate::errors::VehicleError;
use crate::observability::metrics::get_metrics;
use crate::vehicle::capability::{Capability, CapabilitySet};
use crate::vehicle::reading::{ChargeStatus, Reading};
use crate::vehicle::Vehicle;
use api::{Bulk, VehicleInfo, Vehicles};

pub const VEHICLE_TYPE: &str = "tronity";

static OK_MSG: &str = "ok";
static NOOP_MSG: &str = "noop";
static ERROR_MSG: &str = "error";

pub fn capabilities() -> CapabilitySet {
    CapabilitySet::new(&[
        Capability::Soc,
        Capability::Range,
        Capability::ChargeStatus,
        Capability::StartCharge,
        Capability::StopCharge,
    ])
}

/// Registry constructor
pub fn construct(
    name: String,
    config: VehicleConfig,
    client: Client,
) -> BoxFuture<'static, Result<Arc<dyn Vehicle>, VehicleError>> {
    Box::pin(async move {
        let vehicle = Tronity::new(&name, &config, client).await?;
        Ok(Arc::new(vehicle) as Arc<dyn Vehicle>)
    })
}

/// Bulk status endpoint of one vehicle
pub struct BulkEndpoint {
    client: Arc<AuthorizedClient>,
    uri: String,
}

impl BulkSource for BulkEndpoint {
    type Snapshot = Bulk;

    async fn fetch(&self) -> Result<Bulk, VehicleError> {
        self.client.get_json::<Bulk>(&self.uri).await
    }
}

pub struct Tronity {
    name: String,
    title: String,
    capacity: Option<f64>,
    api_uri: String,
    vehicle_id: String,
    client: Arc<AuthorizedClient>,
    bulk: CachedBulk<BulkEndpoint>,
}

impl Tronity {
    /// Authenticates and resolves the vehicle; no instance exists on failure.
    pub async fn new(name: &str, config: &VehicleConfig, client: Client) -> Result<Self, VehicleError> {
        config.credentials.validate()?;

        let api_uri = config
            .api_uri
            .as_deref()
            .unwrap_or(api::URI)
            .trim_end_matches('/')
            .to_owned();
        let token_uri = config
            .token_uri
            .clone()
            .unwrap_or_else(|| format!("{}{}", api_uri, api::TOKEN_PATH));

        if config.tokens.is_some() && config.stored_tokens().is_none() {
            warn!(vehicle = name, "incomplete tokens configured, using app grant");
        }
        let provider = TokenProvider::from_config(
            client.clone(),
            &token_uri,
            &config.credentials,
            config.stored_tokens(),
        );
        let authorized = Arc::new(AuthorizedClient::new(client, provider));

        let vehicles: Vehicles = authorized
            .get_json(&format!("{}/v1/vehicles", api_uri))
            .await?;
        let vehicle_id = resolve_vehicle_id(&vehicles.data, config.vin())?;
        info!(
            vehicle = name,
            vehicle_id = %vehicle_id,
            grant = authorized.grant(),
            "tronity vehicle resolved"
        );

        let bulk = CachedBulk::new(
            name,
            BulkEndpoint {
                client: authorized.clone(),
                uri: format!("{}/v1/vehicles/{}/bulk", api_uri, vehicle_id),
            },
            config.cache_ttl(),
        );

        Ok(Self {
            name: name.to_owned(),
            title: config.title.clone().unwrap_or_else(|| name.to_owned()),
            capacity: config.capacity,
            api_uri,
            vehicle_id,
            client: authorized,
            bulk,
        })
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    /// Bare POST action; 405 means the vehicle is already in the requested state.
    async fn action(&self, action: &str) -> Result<(), VehicleError> {
        let metrics = get_metrics().await;
        let uri = format!("{}/v1/vehicles/{}/{}", self.api_uri, self.vehicle_id, action);

        let (result, outcome) = match self.client.post_empty(&uri).await {
            Ok(()) => (Ok(()), OK_MSG),
            Err(err) if err.status() == Some(http::StatusCode::METHOD_NOT_ALLOWED.as_u16()) => {
                info!(vehicle = %self.name, action, "upstream answered 405, nothing to do");
                (Ok(()), NOOP_MSG)
            }
            Err(err) => {
                warn!(vehicle = %self.name, action, error = %err, "charge action failed");
                (Err(err), ERROR_MSG)
            }
        };

        metrics
            .charge_actions
            .with_label_values(&[self.name.as_str(), action, outcome])
            .inc();
        result
    }
}

/// Sole vehicle when no vin is configured, otherwise the unique vin match.
pub fn resolve_vehicle_id(vehicles: &[VehicleInfo], vin: Option<&str>) -> Result<String, VehicleError> {
    let Some(vin) = vin else {
        return match vehicles {
            [only] => Ok(only.id.clone()),
            [] => Err(VehicleError::Configuration("no vehicles visible to the credentials".to_owned())),
            _ => Err(VehicleError::Configuration(format!(
                "{} vehicles visible to the credentials, configure a vin",
                vehicles.len()
            ))),
        };
    };

    let matches: Vec<&VehicleInfo> = vehicles
        .iter()
        .filter(|v| v.vin.eq_ignore_ascii_case(vin))
        .collect();

    match matches.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => Err(VehicleError::NotFound(format!("vin {} not found", vin))),
        _ => Err(VehicleError::Configuration(format!("vin {} matches {} vehicles", vin, matches.len()))),
    }
}

#[async_trait]
impl Vehicle for Tronity {
    fn title(&self) -> &str {
        &self.title
    }

    fn capacity(&self) -> Option<f64> {
        self.capacity
    }

    fn capabilities(&self) -> CapabilitySet {
        capabilities()
    }

    async fn soc(&self) -> Reading<f64> {
        self.bulk.get().await.map(|bulk| bulk.level).into()
    }

    async fn range(&self) -> Reading<i64> {
        self.bulk.get().await.map(|bulk| bulk.range_km()).into()
    }

    async fn status(&self) -> Reading<ChargeStatus> {
        self.bulk.get().await.map(|bulk| bulk.charge_status()).into()
    }

    async fn start_charge(&self) -> Result<(), VehicleError> {
        self.action(api::CHARGE_START).await
    }

    async fn stop_charge(&self) -> Result<(), VehicleError> {
        self.action(api::CHARGE_STOP).await
    }
}
