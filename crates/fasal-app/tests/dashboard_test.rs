//! A visit end to end against wiremock stand-ins for Nominatim and OpenWeather.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{png, DeniedSensor, FixedSensor};
use fasal_app::{CommitOutcome, Dashboard, DetectionOutcome, VisitLocation};
use fasal_core::{
    Coordinate, Error, FileUpload, InputError, LanguageCode, MemoryStore, RegistrationForm,
};
use fasal_services::{ServiceConfig, Services};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHENNAI: Coordinate = Coordinate {
    latitude: 13.08,
    longitude: 80.27,
};

fn config(server: &MockServer) -> ServiceConfig {
    ServiceConfig::default()
        .with_nominatim_url(server.uri())
        .with_weather_url(server.uri())
        .with_weather_api_key("test-key")
        .with_analysis_latency_ms(0)
}

fn dashboard(config: &ServiceConfig) -> Dashboard {
    let services = Services::from_config(config).unwrap();
    Dashboard::new(Arc::new(MemoryStore::new()), services, config)
}

async fn mount_state(server: &MockServer, state: &str) {
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": {"state": state, "country": "India"}
        })))
        .mount(server)
        .await;
}

async fn mount_weather(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": {"temp": 33.1, "humidity": 68},
            "weather": [{"description": "haze"}],
            "name": "Chennai"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_detected_region_drives_language_weather_and_catalog() {
    common::init_tracing();
    let server = MockServer::start().await;
    mount_state(&server, "Tamil Nadu").await;
    mount_weather(&server).await;

    let dashboard = dashboard(&config(&server));
    dashboard
        .register(RegistrationForm::existing("Selvi", "20"))
        .await
        .unwrap();

    let detection = dashboard.detect_locale(&FixedSensor(CHENNAI)).await;
    assert!(detection.applied());
    assert_eq!(detection.language, LanguageCode::Ta);
    assert_eq!(dashboard.language(), LanguageCode::Ta);
    assert_eq!(
        dashboard.session().profile().await.unwrap().language,
        LanguageCode::Ta
    );

    let location = dashboard.location().await;
    assert_eq!(location.coordinate, Some(CHENNAI));
    assert_eq!(location.region.unwrap().as_str(), "Tamil Nadu");

    let report = dashboard.current_weather().await.unwrap();
    assert_eq!(report.condition, "haze");

    assert!(!dashboard.schemes().await.is_empty());
    assert!(!dashboard.crop_trends().await.trending_crops.is_empty());
}

#[tokio::test]
async fn test_denied_location_keeps_language_and_leaves_no_location() {
    let server = MockServer::start().await;
    let dashboard = dashboard(&config(&server));
    dashboard.set_language(LanguageCode::Hi).await.unwrap();

    let detection = dashboard.detect_locale(&DeniedSensor).await;
    assert_eq!(detection.outcome, DetectionOutcome::PositionUnavailable);
    assert_eq!(dashboard.language(), LanguageCode::Hi);
    assert!(matches!(
        dashboard.current_weather().await,
        Err(Error::NotFound(_))
    ));
    assert!(dashboard.schemes().await.is_empty());
}

#[tokio::test]
async fn test_geocoder_outage_falls_back_silently() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let dashboard = dashboard(&config(&server));
    let detection = dashboard.detect_locale(&FixedSensor(CHENNAI)).await;

    assert_eq!(detection.outcome, DetectionOutcome::GeocodeFailed);
    assert_eq!(detection.language, LanguageCode::En);
    // The coordinate is still usable for weather.
    assert_eq!(dashboard.location().await.coordinate, Some(CHENNAI));
}

#[tokio::test]
async fn test_slow_geocoder_times_out_within_configured_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"address": {"state": "Punjab"}}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    let dashboard =
        dashboard(&config(&server)).with_geolocation_timeout(Duration::from_millis(150));

    let started = std::time::Instant::now();
    let detection = dashboard.detect_locale(&FixedSensor(CHENNAI)).await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(detection.outcome, DetectionOutcome::TimedOut);
    assert_eq!(dashboard.language(), LanguageCode::En);
    assert_eq!(dashboard.location().await.coordinate, Some(CHENNAI));
}

#[tokio::test]
async fn test_manual_switch_during_detection_wins() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"address": {"state": "Maharashtra"}}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    let dashboard = dashboard(&config(&server));

    let (detection, manual) = tokio::join!(
        dashboard.detect_locale(&FixedSensor(CHENNAI)),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            dashboard.set_language(LanguageCode::Hi).await
        }
    );

    assert_eq!(manual.unwrap(), CommitOutcome::Applied);
    assert_eq!(
        detection.outcome,
        DetectionOutcome::Committed(CommitOutcome::Stale)
    );
    assert_eq!(dashboard.language(), LanguageCode::Hi);
}

#[tokio::test]
async fn test_place_search_replaces_visit_coordinate() {
    let server = MockServer::start().await;
    mount_state(&server, "Tamil Nadu").await;
    mount_weather(&server).await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Nashik"))
        .and(query_param("countrycodes", "in"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"lat": "19.9975", "lon": "73.7898"}
        ])))
        .mount(&server)
        .await;

    let dashboard = dashboard(&config(&server));
    dashboard.detect_locale(&FixedSensor(CHENNAI)).await;

    dashboard.search_weather(" Nashik ").await.unwrap();

    let location = dashboard.location().await;
    assert_eq!(location.coordinate, Some(Coordinate::new(19.9975, 73.7898)));
    assert_eq!(location.region.unwrap().as_str(), "Tamil Nadu");

    assert!(matches!(
        dashboard.search_weather("  ").await,
        Err(Error::Input(InputError::EmptyQuery))
    ));
}

#[tokio::test]
async fn test_missing_weather_key_is_config_error() {
    let server = MockServer::start().await;
    mount_state(&server, "Kerala").await;
    let config = ServiceConfig::default()
        .with_nominatim_url(server.uri())
        .with_weather_url(server.uri())
        .with_analysis_latency_ms(0);
    let dashboard = dashboard(&config);
    dashboard.detect_locale(&FixedSensor(CHENNAI)).await;

    let err = dashboard.current_weather().await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_ne!(err.user_message(), Error::Network(String::new()).user_message());
}

#[tokio::test]
async fn test_upload_then_logout_keeps_history() {
    let server = MockServer::start().await;
    mount_state(&server, "Punjab").await;
    let dashboard = dashboard(&config(&server));
    dashboard
        .register(RegistrationForm::existing("Gurpreet", "8"))
        .await
        .unwrap();
    dashboard.detect_locale(&FixedSensor(CHENNAI)).await;

    let report = dashboard
        .upload_photo(FileUpload::new("", png(1024, 768, 90)))
        .await
        .unwrap();
    assert!(report.photo.base64_data.starts_with("data:image/jpeg;base64,"));
    assert_eq!(report.analysis.unwrap().unwrap().soil_type, "Loamy Soil");

    dashboard.logout().await.unwrap();

    assert!(dashboard.session().profile().await.is_none());
    assert_eq!(dashboard.location().await, VisitLocation::default());
    assert_eq!(dashboard.capture().photos().len(), 1);
}
