use futures::future::BoxFuture;
use reqwest::Client;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::vehicles::VehicleConfig;
use crate::errors::VehicleError;
use crate::vehicle::capability::{Capability, CapabilitySet};
use crate::vehicle::tronity;
use crate::vehicle::Vehicle;

/// Builds a vehicle from its configured name, settings and a shared http client
pub type VehicleConstructor =
    fn(String, VehicleConfig, Client) -> BoxFuture<'static, Result<Arc<dyn Vehicle>, VehicleError>>;

#[derive(Clone)]
pub struct VehicleFactory {
    pub capabilities: CapabilitySet,
    pub construct: VehicleConstructor,
}

/// Adapter type name -> constructor, assembled at startup and passed explicitly.
#[derive(Clone, Default)]
pub struct VehicleRegistry {
    factories: HashMap<String, VehicleFactory>,
}

impl VehicleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every adapter shipped in this crate
    pub fn with_defaults() -> Result<Self, VehicleError> {
        let mut registry = Self::new();
        registry.register(tronity::VEHICLE_TYPE, tronity::capabilities(), tronity::construct)?;
        Ok(registry)
    }

    pub fn register(
        &mut self,
        vehicle_type: &str,
        capabilities: CapabilitySet,
        construct: VehicleConstructor,
    ) -> Result<(), VehicleError> {
        let key = vehicle_type.to_lowercase();
        if self.factories.contains_key(&key) {
            return Err(VehicleError::Configuration(format!(
                "vehicle type '{}' is already registered",
                key
            )));
        }
        if !capabilities.contains(Capability::Soc) {
            return Err(VehicleError::Configuration(format!(
                "vehicle type '{}' must support '{}'",
                key,
                Capability::Soc
            )));
        }
        self.factories.insert(key, VehicleFactory { capabilities, construct });
        Ok(())
    }

    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn capabilities(&self, vehicle_type: &str) -> Option<&CapabilitySet> {
        self.factories
            .get(&vehicle_type.to_lowercase())
            .map(|factory| &factory.capabilities)
    }

    /// Build one vehicle; fails when the type is unknown or the built
    /// vehicle does not match the registered capabilities.
    pub async fn create(
        &self,
        name: &str,
        config: &VehicleConfig,
        client: &Client,
    ) -> Result<Arc<dyn Vehicle>, VehicleError> {
        let factory = self
            .factories
            .get(&config.vehicle_type.to_lowercase())
            .ok_or_else(|| {
                VehicleError::Configuration(format!(
                    "vehicle '{}': unknown type '{}', known types: {:?}",
                    name,
                    config.vehicle_type,
                    self.types()
                ))
            })?;

        let vehicle = (factory.construct)(name.to_owned(), config.clone(), client.clone()).await?;

        let declared = vehicle.capabilities();
        if declared != factory.capabilities {
            return Err(VehicleError::Configuration(format!(
                "vehicle '{}': capabilities {} differ from registered {}",
                name, declared, factory.capabilities
            )));
        }

        info!(vehicle = name, vehicle_type = %config.vehicle_type, capabilities = %declared, "vehicle created");
        Ok(vehicle)
    }

    /// Build every configured vehicle; any failure aborts the whole set.
    pub async fn create_all(
        &self,
        configs: &HashMap<String, VehicleConfig>,
        client: &Client,
    ) -> Result<BTreeMap<String, Arc<dyn Vehicle>>, VehicleError> {
        let mut vehicles = BTreeMap::new();
        let mut names: Vec<&String> = configs.keys().collect();
        names.sort();

        for name in names {
            let vehicle = self
                .create(name, &configs[name], client)
                .await
                .inspect_err(|err| error!(vehicle = %name, error = %err, "vehicle creation failed"))?;
            vehicles.insert(name.to_owned(), vehicle);
        }
        Ok(vehicles)
    }
}
