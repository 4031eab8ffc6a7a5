use prometheus::{GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Bulk cache metrics
    pub bulk_fetch_requests: IntCounterVec,
    pub bulk_fetch_failures: IntCounterVec,
    pub bulk_fetch_duration: HistogramVec,
    pub cache_hits: IntCounterVec,
    pub cache_coalesced: IntCounterVec,

    // Token metrics
    pub token_refreshes: IntCounterVec,
    pub token_refresh_failures: IntCounterVec,

    // Vehicle metrics
    pub charge_actions: IntCounterVec,
    pub vehicle_soc: GaugeVec,
    pub vehicle_range: IntGaugeVec,
    pub vehicle_charge_status: IntGaugeVec,
    pub vehicle_read_failures: IntCounterVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("vehicleagent".into()), None).expect("metrics registry");

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Bulk cache
            bulk_fetch_requests: IntCounterVec::new(Opts::new("bulk_fetch_requests_total", "Upstream bulk fetches by cache"), &["cache"]).expect("metric"),
            bulk_fetch_failures: IntCounterVec::new(Opts::new("bulk_fetch_failures_total", "Failed upstream bulk fetches by cache"), &["cache", "reason"]).expect("metric"),
            bulk_fetch_duration: HistogramVec::new(HistogramOpts::new("bulk_fetch_duration_seconds", "Upstream bulk fetch duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]), &["cache"]).expect("metric"),
            cache_hits: IntCounterVec::new(Opts::new("cache_hits_total", "Reads served from a fresh snapshot"), &["cache"]).expect("metric"),
            cache_coalesced: IntCounterVec::new(Opts::new("cache_coalesced_total", "Reads that joined an in-flight fetch"), &["cache"]).expect("metric"),

            // Token
            token_refreshes: IntCounterVec::new(Opts::new("token_refreshes_total", "Token refresh attempts by grant"), &["grant"]).expect("metric"),
            token_refresh_failures: IntCounterVec::new(Opts::new("token_refresh_failures_total", "Token refresh failures by grant"), &["grant"]).expect("metric"),

            // Vehicle
            charge_actions: IntCounterVec::new(Opts::new("charge_actions_total", "Charge start/stop requests"), &["vehicle", "action", "outcome"]).expect("metric"),
            vehicle_soc: GaugeVec::new(Opts::new("vehicle_soc_percent", "Last polled state of charge"), &["vehicle"]).expect("metric"),
            vehicle_range: IntGaugeVec::new(Opts::new("vehicle_range_km", "Last polled range"), &["vehicle"]).expect("metric"),
            vehicle_charge_status: IntGaugeVec::new(Opts::new("vehicle_charge_status", "Last polled charge status (0 disconnected, 1 connected, 2 charging)"), &["vehicle"]).expect("metric"),
            vehicle_read_failures: IntCounterVec::new(Opts::new("vehicle_read_failures_total", "Failed vehicle reads"), &["vehicle", "reading"]).expect("metric"),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").expect("metric"),
            up: IntGauge::new("up", "1 if service is healthy").expect("metric"),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(metrics.bulk_fetch_requests.clone()),
            Box::new(metrics.bulk_fetch_failures.clone()),
            Box::new(metrics.bulk_fetch_duration.clone()),
            Box::new(metrics.cache_hits.clone()),
            Box::new(metrics.cache_coalesced.clone()),
            Box::new(metrics.token_refreshes.clone()),
            Box::new(metrics.token_refresh_failures.clone()),
            Box::new(metrics.charge_actions.clone()),
            Box::new(metrics.vehicle_soc.clone()),
            Box::new(metrics.vehicle_range.clone()),
            Box::new(metrics.vehicle_charge_status.clone()),
            Box::new(metrics.vehicle_read_failures.clone()),
            Box::new(metrics.config_validation_errors.clone()),
            Box::new(metrics.up.clone()),
        ];
        for collector in collectors {
            reg.register(collector).expect("metric registration");
        }

        metrics
    }
}
