use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::VehicleError;
use crate::server::server::AppState;
use crate::vehicle::capability::{Capability, CapabilitySet};
use crate::vehicle::reading::{ChargeStatus, Reading};
use crate::vehicle::{Vehicle, VehicleMap};

#[derive(Clone)]
pub struct VehiclesState {
    vehicles: VehicleMap,
}

impl VehiclesState {
    pub fn new(vehicles: VehicleMap) -> Self {
        Self { vehicles }
    }

    pub fn router(&self) -> Router<AppState> {
        Router::new()
            .route("/vehicles", get(list_vehicles))
            .route("/vehicles/{name}", get(read_vehicle))
            .route("/vehicles/{name}/charge/start", post(start_charge))
            .route("/vehicles/{name}/charge/stop", post(stop_charge))
    }

    fn get(&self, name: &str) -> Result<&Arc<dyn Vehicle>, Response> {
        self.vehicles.get(name).ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("vehicle '{}' not found", name) })),
            )
                .into_response()
        })
    }
}

#[derive(Serialize)]
struct VehicleSummary {
    title: String,
    capacity: Option<f64>,
    capabilities: CapabilitySet,
}

#[derive(Serialize)]
struct VehicleReadings {
    title: String,
    soc: Option<f64>,
    range: Option<i64>,
    status: Option<ChargeStatus>,
    errors: BTreeMap<&'static str, String>,
}

async fn list_vehicles(State(state): State<AppState>) -> Json<BTreeMap<String, VehicleSummary>> {
    let summaries = state
        .vehicles_state
        .vehicles
        .iter()
        .map(|(name, vehicle)| {
            (
                name.clone(),
                VehicleSummary {
                    title: vehicle.title().to_owned(),
                    capacity: vehicle.capacity(),
                    capabilities: vehicle.capabilities(),
                },
            )
        })
        .collect();
    Json(summaries)
}

async fn read_vehicle(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let vehicle = match state.vehicles_state.get(&name) {
        Ok(vehicle) => vehicle,
        Err(response) => return response,
    };
    let capabilities = vehicle.capabilities();
    let mut readings = VehicleReadings {
        title: vehicle.title().to_owned(),
        soc: None,
        range: None,
        status: None,
        errors: BTreeMap::new(),
    };

    readings.soc = Some(collect(Capability::Soc, vehicle.soc().await, &mut readings.errors));
    if capabilities.contains(Capability::Range) {
        readings.range = Some(collect(Capability::Range, vehicle.range().await, &mut readings.errors));
    }
    if capabilities.contains(Capability::ChargeStatus) {
        readings.status = Some(collect(Capability::ChargeStatus, vehicle.status().await, &mut readings.errors));
    }

    Json(readings).into_response()
}

fn collect<T>(capability: Capability, reading: Reading<T>, errors: &mut BTreeMap<&'static str, String>) -> T {
    if let Some(err) = &reading.error {
        errors.insert(capability.as_str(), err.to_string());
    }
    reading.value
}

async fn start_charge(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.vehicles_state.get(&name) {
        Ok(vehicle) => action_response(vehicle.start_charge().await),
        Err(response) => response,
    }
}

async fn stop_charge(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.vehicles_state.get(&name) {
        Ok(vehicle) => action_response(vehicle.stop_charge().await),
        Err(response) => response,
    }
}

fn action_response(result: Result<(), VehicleError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err @ VehicleError::Unsupported(_)) => {
            (StatusCode::NOT_IMPLEMENTED, Json(json!({ "error": err.to_string() }))).into_response()
        }
        Err(err) => (StatusCode::BAD_GATEWAY, Json(json!({ "error": err.to_string() }))).into_response(),
    }
}
