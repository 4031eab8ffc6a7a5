use serde::{Deserialize, Deserializer};

use crate::vehicle::reading::ChargeStatus;

pub const URI: &str = "https://api.tronity.tech";
pub const TOKEN_PATH: &str = "/authentication";

pub const CHARGE_START: &str = "charge_start";
pub const CHARGE_STOP: &str = "charge_stop";

/// `GET /v1/vehicles`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Vehicles {
    #[serde(default)]
    pub data: Vec<VehicleInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub id: String,
    #[serde(default)]
    pub vin: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// `GET /v1/vehicles/{id}/bulk`
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bulk {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub odometer: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub range: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub level: f64,
    #[serde(default)]
    pub charging: Option<String>,
    #[serde(default)]
    pub charge_remaining_time: Option<i64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Upstream sends `null` for readings it does not have
fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Option::<f64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Bulk {
    /// Only "Charging" is C. "Idle" reads as B, and so do "Complete" and
    /// "Stopped", which the vendor reports for a plugged car after a session.
    /// Unknown or missing charging states count as disconnected.
    pub fn charge_status(&self) -> ChargeStatus {
        match self.charging.as_deref() {
            Some("Charging") => ChargeStatus::Charging,
            Some("Idle") | Some("Complete") | Some("Stopped") => ChargeStatus::Connected,
            _ => ChargeStatus::Disconnected,
        }
    }

    /// Range in whole km
    pub fn range_km(&self) -> i64 {
        self.range as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bulk_decodes_and_maps_charging_state() {
        let bulk: Bulk = serde_json::from_value(json!({
            "odometer": 12034.5,
            "range": 310.8,
            "level": 72.5,
            "charging": "Charging",
            "chargeRemainingTime": 3600,
            "plugged": true
        }))
        .unwrap();

        assert_eq!(bulk.level, 72.5);
        assert_eq!(bulk.range_km(), 310);
        assert_eq!(bulk.charge_remaining_time, Some(3600));
        assert_eq!(bulk.charge_status(), ChargeStatus::Charging);
    }

    #[test]
    fn null_readings_decode_as_zero() {
        let bulk: Bulk = serde_json::from_value(json!({
            "odometer": null,
            "range": null,
            "level": 72.5,
            "charging": "Charging"
        }))
        .unwrap();

        assert_eq!(bulk.range_km(), 0);
        assert_eq!(bulk.odometer, 0.0);
        assert_eq!(bulk.level, 72.5);
    }

    #[test]
    fn unknown_or_missing_charging_state_is_disconnected() {
        for charging in [None, Some("Disconnected"), Some("charging"), Some("Teleporting")] {
            let bulk = Bulk {
                charging: charging.map(str::to_owned),
                ..Bulk::default()
            };
            assert_eq!(bulk.charge_status(), ChargeStatus::Disconnected, "{:?}", charging);
        }

        let idle = Bulk {
            charging: Some("Idle".into()),
            ..Bulk::default()
        };
        assert_eq!(idle.charge_status(), ChargeStatus::Connected);
    }
}
