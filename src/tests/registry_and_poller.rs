#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;
    use reqwest::Client;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;
    use std::time::Duration;

    use httpmock::MockServer;

    use crate::config::vehicles::{Credentials, VehicleConfig};
    use crate::controller::poller::Poller;
    use crate::errors::VehicleError;
    use crate::observability::metrics::get_metrics;
    use crate::tests::common::{
        build_reqwest_client, mock_app_token, mock_bulk, mock_vehicles, tronity_config, FakeVehicle,
    };
    use crate::vehicle::capability::{Capability, CapabilitySet};
    use crate::vehicle::registry::VehicleRegistry;
    use crate::vehicle::{tronity, Vehicle, VehicleMap};

    fn fake_config(vehicle_type: &str) -> VehicleConfig {
        VehicleConfig {
            vehicle_type: vehicle_type.to_owned(),
            title: None,
            capacity: None,
            credentials: Credentials::new("id", "secret"),
            tokens: None,
            vin: None,
            cache_seconds: 60,
            api_uri: None,
            token_uri: None,
        }
    }

    fn construct_fake(
        _name: String,
        _config: VehicleConfig,
        _client: Client,
    ) -> BoxFuture<'static, Result<Arc<dyn Vehicle>, VehicleError>> {
        Box::pin(async { Ok(Arc::new(FakeVehicle::new(Ok(50.0))) as Arc<dyn Vehicle>) })
    }

    fn soc_only() -> CapabilitySet {
        CapabilitySet::new(&[Capability::Soc])
    }

    #[test]
    fn defaults_register_tronity_with_full_capabilities() {
        let registry = VehicleRegistry::with_defaults().unwrap();

        assert_eq!(registry.types(), vec!["tronity"]);
        assert_eq!(registry.capabilities("Tronity"), Some(&tronity::capabilities()));
        assert!(registry.capabilities("unknown").is_none());
    }

    #[test]
    fn registration_rules_are_enforced() {
        let mut registry = VehicleRegistry::new();
        registry.register("fake", soc_only(), construct_fake).unwrap();

        let duplicate = registry.register("FAKE", soc_only(), construct_fake);
        assert!(matches!(duplicate, Err(VehicleError::Configuration(_))));

        let without_soc = registry.register("rangeonly", CapabilitySet::new(&[Capability::Range]), construct_fake);
        assert!(matches!(without_soc, Err(VehicleError::Configuration(_))));
    }

    #[tokio::test]
    async fn create_builds_registered_type() {
        let mut registry = VehicleRegistry::new();
        registry.register("fake", soc_only(), construct_fake).unwrap();

        let vehicle = registry.create("car", &fake_config("fake"), &build_reqwest_client()).await.unwrap();

        assert_eq!(vehicle.soc().await.value, 50.0);
        assert_eq!(vehicle.capabilities(), soc_only());
    }

    #[tokio::test]
    async fn unknown_type_is_a_configuration_error() {
        let registry = VehicleRegistry::with_defaults().unwrap();

        let err = registry
            .create("car", &fake_config("teleporter"), &build_reqwest_client())
            .await
            .err()
            .unwrap();

        assert!(matches!(err, VehicleError::Configuration(_)));
        assert!(err.to_string().contains("teleporter"));
    }

    #[tokio::test]
    async fn capability_mismatch_is_rejected() {
        let mut registry = VehicleRegistry::new();
        registry.register("fake", tronity::capabilities(), construct_fake).unwrap();

        let result = registry.create("car", &fake_config("fake"), &build_reqwest_client()).await;

        assert!(matches!(result, Err(VehicleError::Configuration(_))));
    }

    #[tokio::test]
    async fn one_failing_vehicle_aborts_create_all() {
        let mut registry = VehicleRegistry::new();
        registry.register("fake", soc_only(), construct_fake).unwrap();
        let configs = HashMap::from([
            ("a".to_owned(), fake_config("fake")),
            ("b".to_owned(), fake_config("missing")),
        ]);

        assert!(registry.create_all(&configs, &build_reqwest_client()).await.is_err());

        let configs = HashMap::from([("a".to_owned(), fake_config("fake"))]);
        let vehicles = registry.create_all(&configs, &build_reqwest_client()).await.unwrap();
        assert_eq!(vehicles.keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[tokio::test]
    async fn unsupported_operations_report_their_capability() {
        let vehicle = FakeVehicle::new(Ok(10.0));

        let range = vehicle.range().await;
        assert_eq!(range.value, 0);
        assert_eq!(range.error, Some(VehicleError::Unsupported(Capability::Range)));
        assert_eq!(
            vehicle.start_charge().await,
            Err(VehicleError::Unsupported(Capability::StartCharge))
        );
        assert_eq!(
            vehicle.stop_charge().await,
            Err(VehicleError::Unsupported(Capability::StopCharge))
        );
    }

    #[tokio::test]
    async fn poller_counts_failed_reads_and_skips_undeclared_capabilities() {
        let vehicles: VehicleMap = Arc::new(BTreeMap::from([
            ("poll-ok".to_owned(), Arc::new(FakeVehicle::new(Ok(81.0))) as Arc<dyn Vehicle>),
            (
                "poll-failing".to_owned(),
                Arc::new(FakeVehicle::new(Err(VehicleError::upstream(Some(503), "down")))) as Arc<dyn Vehicle>,
            ),
        ]));
        let poller = Poller::new(vehicles, Duration::from_secs(60));

        assert_eq!(poller.poll_once().await, 1);

        let metrics = get_metrics().await;
        assert_eq!(metrics.vehicle_soc.with_label_values(&["poll-ok"]).get(), 81.0);
        assert_eq!(
            metrics
                .vehicle_read_failures
                .with_label_values(&["poll-failing", "soc"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn poller_reads_tronity_through_one_bulk_fetch() {
        let server = MockServer::start_async().await;
        mock_app_token(&server, "app-token").await;
        mock_vehicles(&server, "app-token", json!([{"id": "veh-9", "vin": "VIN9"}])).await;
        let bulk_mock = mock_bulk(&server, "veh-9", 200, json!({"level": 63.0, "range": 240.4, "charging": "Complete"})).await;

        let registry = VehicleRegistry::with_defaults().unwrap();
        let configs = HashMap::from([("poll-tronity".to_owned(), tronity_config(&server, None, None, 60))]);
        let vehicles = registry.create_all(&configs, &build_reqwest_client()).await.unwrap();
        let poller = Poller::new(Arc::new(vehicles), Duration::from_secs(60));

        assert_eq!(poller.poll_once().await, 0);

        let metrics = get_metrics().await;
        assert_eq!(metrics.vehicle_soc.with_label_values(&["poll-tronity"]).get(), 63.0);
        assert_eq!(metrics.vehicle_range.with_label_values(&["poll-tronity"]).get(), 240);
        assert_eq!(metrics.vehicle_charge_status.with_label_values(&["poll-tronity"]).get(), 1);
        bulk_mock.assert_hits_async(1).await;
    }
}
