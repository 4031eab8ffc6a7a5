use thiserror::Error;

use crate::vehicle::capability::Capability;

/// Errors surfaced by token handling, the bulk cache and vehicle adapters.
///
/// The type is `Clone` because a single upstream outcome is handed to every
/// caller waiting on the same in-flight fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VehicleError {
    /// Missing or invalid settings, ambiguous vehicle identity, registry misuse.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token acquisition or refresh failed.
    #[error("token refresh failed: {0}")]
    Auth(String),

    /// Non-2xx response or transport failure talking to the upstream api.
    #[error("upstream error{}: {message}", status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Upstream { status: Option<u16>, message: String },

    /// Upstream answered but the body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The configured vin is not visible to the credentials.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("capability '{0}' is not supported by this vehicle")]
    Unsupported(Capability),
}

impl VehicleError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream { status, message: message.into() }
    }

    /// Upstream http status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            VehicleError::Upstream { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for VehicleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return VehicleError::Decode(err.to_string());
        }
        VehicleError::upstream(err.status().map(|s| s.as_u16()), err.to_string())
    }
}
