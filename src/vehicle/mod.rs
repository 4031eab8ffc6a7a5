//! Polymorphic vehicle interface consumed by the controller.
//!
//! Adapters implement [`Vehicle`] and declare the optional capabilities they
//! support; the registry checks the declaration when a vehicle is built.

pub mod capability;
pub mod reading;
pub mod registry;
pub mod tronity;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::VehicleError;
use capability::{Capability, CapabilitySet};
use reading::{ChargeStatus, Reading};

/// Built vehicles by configured name
pub type VehicleMap = Arc<BTreeMap<String, Arc<dyn Vehicle>>>;

#[async_trait]
pub trait Vehicle: Send + Sync {
    /// configured display name
    fn title(&self) -> &str;

    /// battery capacity in kWh
    fn capacity(&self) -> Option<f64>;

    fn capabilities(&self) -> CapabilitySet;

    /// state of charge in percent
    async fn soc(&self) -> Reading<f64>;

    /// remaining range in km
    async fn range(&self) -> Reading<i64> {
        Reading::failed(VehicleError::Unsupported(Capability::Range))
    }

    async fn status(&self) -> Reading<ChargeStatus> {
        Reading::failed(VehicleError::Unsupported(Capability::ChargeStatus))
    }

    async fn start_charge(&self) -> Result<(), VehicleError> {
        Err(VehicleError::Unsupported(Capability::StartCharge))
    }

    async fn stop_charge(&self) -> Result<(), VehicleError> {
        Err(VehicleError::Unsupported(Capability::StopCharge))
    }
}
