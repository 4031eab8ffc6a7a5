use serde::Serialize;

use crate::errors::VehicleError;

/// Charging state following IEC 61851 pilot states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    /// A
    #[default]
    Disconnected,
    /// B
    Connected,
    /// C
    Charging,
}

impl ChargeStatus {
    pub fn letter(&self) -> &'static str {
        match self {
            ChargeStatus::Disconnected => "A",
            ChargeStatus::Connected => "B",
            ChargeStatus::Charging => "C",
        }
    }

    pub fn as_gauge(&self) -> i64 {
        match self {
            ChargeStatus::Disconnected => 0,
            ChargeStatus::Connected => 1,
            ChargeStatus::Charging => 2,
        }
    }
}

/// Result of a typed read.
///
/// A failed read still carries a value: the zero placeholder for the type
/// (`0.0`, `0`, [`ChargeStatus::Disconnected`]), so a controller can treat one
/// failed poll as transient.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading<T> {
    pub value: T,
    pub error: Option<VehicleError>,
}

impl<T> Reading<T> {
    pub fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<T, VehicleError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }
}

impl<T: Default> Reading<T> {
    pub fn failed(error: VehicleError) -> Self {
        Self {
            value: T::default(),
            error: Some(error),
        }
    }
}

impl<T: Default> From<Result<T, VehicleError>> for Reading<T> {
    fn from(result: Result<T, VehicleError>) -> Self {
        match result {
            Ok(value) => Reading::ok(value),
            Err(err) => Reading::failed(err),
        }
    }
}
