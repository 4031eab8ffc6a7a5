use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::errors::VehicleError;
use crate::observability::metrics::get_metrics;
use crate::vehicle::capability::Capability;
use crate::vehicle::VehicleMap;

/// Reads every vehicle on a fixed schedule. A failed read is logged and
/// counted; the next cycle simply tries again.
pub struct Poller {
    vehicles: VehicleMap,
    interval: Duration,
}

impl Poller {
    pub fn new(vehicles: VehicleMap, interval: Duration) -> Self {
        Self { vehicles, interval }
    }

    /// One pass over all vehicles, returns the number of failed reads
    pub async fn poll_once(&self) -> usize {
        let metrics = get_metrics().await;
        let mut failures = 0;

        for (name, vehicle) in self.vehicles.iter() {
            let capabilities = vehicle.capabilities();
            let mut record_failure = |reading: Capability, err: &VehicleError| {
                failures += 1;
                warn!(vehicle = %name, reading = %reading, error = %err, "vehicle read failed");
                metrics
                    .vehicle_read_failures
                    .with_label_values(&[name.as_str(), reading.as_str()])
                    .inc();
            };

            let soc = vehicle.soc().await;
            match &soc.error {
                None => metrics.vehicle_soc.with_label_values(&[name.as_str()]).set(soc.value),
                Some(err) => record_failure(Capability::Soc, err),
            }

            let range = if capabilities.contains(Capability::Range) {
                let range = vehicle.range().await;
                match &range.error {
                    None => metrics.vehicle_range.with_label_values(&[name.as_str()]).set(range.value),
                    Some(err) => record_failure(Capability::Range, err),
                }
                Some(range.value)
            } else {
                None
            };

            let status = if capabilities.contains(Capability::ChargeStatus) {
                let status = vehicle.status().await;
                if let Some(err) = &status.error {
                    record_failure(Capability::ChargeStatus, err);
                }
                // disconnected placeholder is published on error as well
                metrics
                    .vehicle_charge_status
                    .with_label_values(&[name.as_str()])
                    .set(status.value.as_gauge());
                Some(status.value)
            } else {
                None
            };

            info!(
                vehicle = %name,
                soc = soc.value,
                range = ?range,
                status = ?status.map(|s| s.letter()),
                "vehicle polled"
            );
        }
        failures
    }

    pub async fn run(self) -> Result<()> {
        info!(
            vehicles = self.vehicles.len(),
            interval_seconds = self.interval.as_secs(),
            "poller started"
        );
        loop {
            let failures = self.poll_once().await;
            if failures > 0 {
                warn!(failures, "poll cycle finished with failed reads");
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
