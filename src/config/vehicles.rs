use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::config::settings::SettingsConfig;
use crate::errors::VehicleError;

/// evcc-compatible default: one upstream bulk call per 15 minutes
pub const DEFAULT_CACHE_SECONDS: u64 = 15 * 60;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub vehicles: HashMap<String, VehicleConfig>,
}

/// ================================
/// Vehicles
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct VehicleConfig {
    /// adapter type, resolved through the vehicle registry, e.g. "tronity"
    #[serde(rename = "type")]
    pub vehicle_type: String,
    #[serde(default)]
    pub title: Option<String>,
    /// battery capacity in kWh
    #[serde(default)]
    pub capacity: Option<f64>,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub tokens: Option<Tokens>,
    /// selects the vehicle when the account sees more than one, case-insensitive
    #[serde(default)]
    pub vin: Option<String>,
    /// bulk status cache ttl
    #[serde(default = "default_cache_seconds")]
    pub cache_seconds: u64,
    /// upstream api base, defaults to the vendor endpoint
    #[serde(default)]
    pub api_uri: Option<String>,
    /// token endpoint, defaults to the vendor endpoint
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl VehicleConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_seconds)
    }

    /// Configured vin, blank treated as absent
    pub fn vin(&self) -> Option<&str> {
        self.vin.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Stored tokens, only when both halves are present
    pub fn stored_tokens(&self) -> Option<&Tokens> {
        self.tokens.as_ref().filter(|t| t.is_complete())
    }
}

/// OAuth2 client credentials
#[derive(Deserialize, Clone, Default)]
pub struct Credentials {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub secret: String,
}

impl Credentials {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }

    pub fn validate(&self) -> Result<(), VehicleError> {
        if self.id.trim().is_empty() || self.secret.trim().is_empty() {
            return Err(VehicleError::Configuration("missing credentials id or secret".to_owned()));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("secret", &"***")
            .finish()
    }
}

/// Access/refresh pair produced out of band by the authorization-code flow
#[derive(Deserialize, Clone, Default)]
pub struct Tokens {
    #[serde(default)]
    pub access: String,
    #[serde(default)]
    pub refresh: String,
}

impl Tokens {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.access.trim().is_empty() && !self.refresh.trim().is_empty()
    }
}

impl fmt::Debug for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokens")
            .field("access", &"***")
            .field("refresh", &"***")
            .finish()
    }
}

fn default_cache_seconds() -> u64 {
    DEFAULT_CACHE_SECONDS
}
