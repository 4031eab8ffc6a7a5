// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use async_trait::async_trait;
use httpmock::Method::{GET, POST};
use httpmock::{Mock, MockServer};
use parking_lot::Mutex;
use reqwest::Client;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::cached_bulk::BulkSource;
use crate::config::vehicles::{Credentials, Tokens, VehicleConfig};
use crate::errors::VehicleError;
use crate::vehicle::capability::{Capability, CapabilitySet};
use crate::vehicle::reading::Reading;
use crate::vehicle::tronity::api::Bulk;
use crate::vehicle::Vehicle;

pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn bulk(level: f64, range: f64, charging: &str) -> Bulk {
    Bulk {
        level,
        range,
        charging: Some(charging.to_owned()),
        ..Bulk::default()
    }
}

/// Bulk source replaying scripted outcomes, counting calls
#[derive(Clone)]
pub struct ScriptedSource {
    pub calls: Arc<AtomicUsize>,
    outcomes: Arc<Mutex<VecDeque<Result<Bulk, VehicleError>>>>,
    delay: Duration,
}

impl ScriptedSource {
    pub fn new(outcomes: Vec<Result<Bulk, VehicleError>>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            outcomes: Arc::new(Mutex::new(outcomes.into())),
            delay: Duration::ZERO,
        }
    }

    /// every fetch takes `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BulkSource for ScriptedSource {
    type Snapshot = Bulk;

    async fn fetch(&self) -> Result<Bulk, VehicleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(VehicleError::upstream(None, "script exhausted")));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        outcome
    }
}

/// Vehicle supporting only state of charge
pub struct FakeVehicle {
    pub soc: Result<f64, VehicleError>,
    pub capabilities: CapabilitySet,
}

impl FakeVehicle {
    pub fn new(soc: Result<f64, VehicleError>) -> Self {
        Self {
            soc,
            capabilities: CapabilitySet::new(&[Capability::Soc]),
        }
    }
}

#[async_trait]
impl Vehicle for FakeVehicle {
    fn title(&self) -> &str {
        "fake"
    }

    fn capacity(&self) -> Option<f64> {
        None
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities.clone()
    }

    async fn soc(&self) -> Reading<f64> {
        self.soc.clone().into()
    }
}

pub fn tronity_config(server: &MockServer, tokens: Option<Tokens>, vin: Option<&str>, cache_seconds: u64) -> VehicleConfig {
    VehicleConfig {
        vehicle_type: "tronity".to_owned(),
        title: Some("Test car".to_owned()),
        capacity: Some(58.0),
        credentials: Credentials::new(CLIENT_ID, CLIENT_SECRET),
        tokens,
        vin: vin.map(str::to_owned),
        cache_seconds,
        api_uri: Some(server.base_url()),
        token_uri: None,
    }
}

/// App grant token endpoint answering with `access`
pub async fn mock_app_token<'a>(server: &'a MockServer, access: &str) -> Mock<'a> {
    let body = json!({"access_token": access, "token_type": "bearer", "expires_in": 3600});
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/authentication")
                .json_body(json!({
                    "client_id": CLIENT_ID,
                    "client_secret": CLIENT_SECRET,
                    "grant_type": "app"
                }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(body);
        })
        .await
}

/// Vehicle list visible only with `Bearer {access}`
pub async fn mock_vehicles<'a>(server: &'a MockServer, access: &str, vehicles: serde_json::Value) -> Mock<'a> {
    let bearer = format!("Bearer {}", access);
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/vehicles").header("Authorization", bearer);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "data": vehicles }));
        })
        .await
}

pub async fn mock_bulk<'a>(server: &'a MockServer, vehicle_id: &str, status: u16, body: serde_json::Value) -> Mock<'a> {
    let path = format!("/v1/vehicles/{}/bulk", vehicle_id);
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            then.status(status)
                .header("Content-Type", "application/json")
                .json_body(body);
        })
        .await
}
