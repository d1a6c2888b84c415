//! Prediction endpoint tests
//!
//! Tests for the full request path:
//! - Weather provider and valve controller run as wiremock servers
//! - The classifier is a stub that records every call
//! - Requests go through the real router, middleware included

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shared::{FeatureVector, Location};
use smart_irrigation_backend::config::{ActuatorConfig, Config, ResponseConfig, WeatherConfig};
use smart_irrigation_backend::external::{ValveClient, WeatherClient};
use smart_irrigation_backend::services::{Classifier, ClassifierError, PredictionService};
use smart_irrigation_backend::{build_state, create_app, AppState};
use tower::ServiceExt;
use wiremock::{
    matchers::{any, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

// ============================================================================
// Helpers
// ============================================================================

/// Classifier stub returning a fixed label, or failing when `label` is None
struct StubClassifier {
    label: Option<u8>,
    seen: Mutex<Vec<FeatureVector>>,
}

impl StubClassifier {
    fn returning(label: u8) -> Arc<Self> {
        Arc::new(Self {
            label: Some(label),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            label: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError> {
        self.seen.lock().unwrap().push(*features);
        self.label
            .ok_or_else(|| ClassifierError::InvalidInput("stub refused input".to_string()))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// WeatherAPI `forecast.json` body
fn weather_body(temp_avg: f64, temp_max: f64, temp_min: f64, precip: f64) -> Value {
    json!({
        "location": { "name": "Coimbatore", "region": "Tamil Nadu", "country": "India" },
        "current": {
            "last_updated": "2024-11-17 14:15",
            "temp_c": temp_avg,
            "precip_mm": precip,
            "humidity": 62
        },
        "forecast": {
            "forecastday": [
                {
                    "date": "2024-11-17",
                    "day": { "maxtemp_c": temp_max, "mintemp_c": temp_min, "totalprecip_mm": 0.4 }
                }
            ]
        }
    })
}

async fn mount_weather(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        .and(query_param("key", "test-key"))
        .and(query_param("q", "Coimbatore"))
        .and(query_param("days", "1"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_valve(server: &MockServer, state: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path("/toggle_valve"))
        .and(query_param("state", state))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(server)
        .await;
}

/// Valve mock that fails verification if it is ever hit
async fn mount_valve_never_called(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

fn test_config(weather_url: &str, valve_url: &str) -> Config {
    Config {
        environment: "test".to_string(),
        weather: WeatherConfig {
            api_endpoint: weather_url.to_string(),
            api_key: "test-key".to_string(),
            timeout_secs: 2,
            ..Default::default()
        },
        actuator: ActuatorConfig {
            base_url: valve_url.to_string(),
            timeout_secs: 2,
        },
        ..Default::default()
    }
}

fn app_with(config: Config, classifier: Arc<StubClassifier>) -> Router {
    let predictor = PredictionService::new(
        Arc::new(WeatherClient::new(&config.weather).unwrap()),
        classifier,
        Arc::new(ValveClient::new(&config.actuator).unwrap()),
        Location::new(config.weather.location.as_str()).unwrap(),
    );
    create_app(AppState::new(config, predictor))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ============================================================================
// Success scenarios
// ============================================================================

#[tokio::test]
async fn test_hot_dry_day_waters_plants() {
    let weather = MockServer::start().await;
    let valve = MockServer::start().await;
    mount_weather(
        &weather,
        ResponseTemplate::new(200).set_body_json(weather_body(28.5, 33.0, 22.0, 0.0)),
    )
    .await;
    mount_valve(&valve, "on", 200).await;

    let classifier = StubClassifier::returning(1);
    let app = app_with(test_config(&weather.uri(), &valve.uri()), classifier.clone());

    let (status, body) = get(app, "/predict").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "water_plants": 1,
            "temperature": 28.5,
            "precipitation_mm": 0.0,
            "humidity": 0.0
        })
    );

    // Features reach the classifier unchanged, in training order
    let seen = classifier.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].as_array(), [0.0, 28.5, 33.0, 22.0]);

    weather.verify().await;
    valve.verify().await;
}

#[tokio::test]
async fn test_wet_day_turns_valve_off() {
    let weather = MockServer::start().await;
    let valve = MockServer::start().await;
    mount_weather(
        &weather,
        ResponseTemplate::new(200).set_body_json(weather_body(24.0, 27.5, 19.0, 6.2)),
    )
    .await;
    mount_valve(&valve, "off", 200).await;

    let app = app_with(
        test_config(&weather.uri(), &valve.uri()),
        StubClassifier::returning(0),
    );

    let (status, body) = get(app, "/predict").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["water_plants"], 0);
    assert_eq!(body["temperature"], 24.0);
    assert_eq!(body["precipitation_mm"], 6.2);
    valve.verify().await;
}

#[tokio::test]
async fn test_legacy_humidity_field_can_be_disabled() {
    let weather = MockServer::start().await;
    let valve = MockServer::start().await;
    mount_weather(
        &weather,
        ResponseTemplate::new(200).set_body_json(weather_body(28.5, 33.0, 22.0, 0.0)),
    )
    .await;
    mount_valve(&valve, "on", 200).await;

    let mut config = test_config(&weather.uri(), &valve.uri());
    config.response = ResponseConfig {
        legacy_humidity_field: false,
    };
    let app = app_with(config, StubClassifier::returning(1));

    let (status, body) = get(app, "/predict").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("humidity").is_none());
    assert_eq!(body["precipitation_mm"], 0.0);
}

// ============================================================================
// Weather failures
// ============================================================================

#[tokio::test]
async fn test_weather_server_error_returns_500() {
    let weather = MockServer::start().await;
    let valve = MockServer::start().await;
    mount_weather(
        &weather,
        ResponseTemplate::new(500).set_body_string("Internal Server Error"),
    )
    .await;
    mount_valve_never_called(&valve).await;

    let classifier = StubClassifier::returning(1);
    let app = app_with(test_config(&weather.uri(), &valve.uri()), classifier.clone());

    let (status, body) = get(app, "/predict").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch weather data" }));
    assert_eq!(classifier.calls(), 0);
    valve.verify().await;
}

#[tokio::test]
async fn test_invalid_api_key_returns_500() {
    let weather = MockServer::start().await;
    let valve = MockServer::start().await;
    mount_weather(
        &weather,
        ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": 2006, "message": "API key is invalid." }
        })),
    )
    .await;
    mount_valve_never_called(&valve).await;

    let classifier = StubClassifier::returning(1);
    let app = app_with(test_config(&weather.uri(), &valve.uri()), classifier.clone());

    let (status, body) = get(app, "/predict").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // Provider detail stays in the logs
    assert_eq!(body, json!({ "error": "Failed to fetch weather data" }));
    assert_eq!(classifier.calls(), 0);
    valve.verify().await;
}

#[tokio::test]
async fn test_malformed_weather_json_returns_500() {
    let weather = MockServer::start().await;
    let valve = MockServer::start().await;
    mount_weather(
        &weather,
        ResponseTemplate::new(200)
            .set_body_string("{ not valid json")
            .insert_header("content-type", "application/json"),
    )
    .await;
    mount_valve_never_called(&valve).await;

    let classifier = StubClassifier::returning(1);
    let app = app_with(test_config(&weather.uri(), &valve.uri()), classifier.clone());

    let (status, body) = get(app, "/predict").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch weather data");
    assert_eq!(classifier.calls(), 0);
    valve.verify().await;
}

#[tokio::test]
async fn test_partial_weather_data_returns_500() {
    let weather = MockServer::start().await;
    let valve = MockServer::start().await;
    mount_weather(
        &weather,
        ResponseTemplate::new(200).set_body_json(json!({
            "current": { "temp_c": 28.5, "precip_mm": 0.0 },
            "forecast": { "forecastday": [] }
        })),
    )
    .await;
    mount_valve_never_called(&valve).await;

    let classifier = StubClassifier::returning(1);
    let app = app_with(test_config(&weather.uri(), &valve.uri()), classifier.clone());

    let (status, body) = get(app, "/predict").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch weather data");
    assert_eq!(classifier.calls(), 0);
    valve.verify().await;
}

// ============================================================================
// Classifier failures
// ============================================================================

#[tokio::test]
async fn test_classifier_failure_returns_500_without_actuation() {
    let weather = MockServer::start().await;
    let valve = MockServer::start().await;
    mount_weather(
        &weather,
        ResponseTemplate::new(200).set_body_json(weather_body(28.5, 33.0, 22.0, 0.0)),
    )
    .await;
    mount_valve_never_called(&valve).await;

    let classifier = StubClassifier::failing();
    let app = app_with(test_config(&weather.uri(), &valve.uri()), classifier.clone());

    let (status, body) = get(app, "/predict").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Prediction failed" }));
    assert_eq!(classifier.calls(), 1);
    valve.verify().await;
}

// ============================================================================
// Valve failures
// ============================================================================

#[tokio::test]
async fn test_valve_error_still_returns_decision() {
    let weather = MockServer::start().await;
    let valve = MockServer::start().await;
    mount_weather(
        &weather,
        ResponseTemplate::new(200).set_body_json(weather_body(28.5, 33.0, 22.0, 0.0)),
    )
    .await;
    mount_valve(&valve, "on", 503).await;

    let app = app_with(
        test_config(&weather.uri(), &valve.uri()),
        StubClassifier::returning(1),
    );

    let (status, body) = get(app, "/predict").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["water_plants"], 1);
    assert_eq!(body["temperature"], 28.5);
    valve.verify().await;
}

#[tokio::test]
async fn test_unreachable_valve_still_returns_decision() {
    let weather = MockServer::start().await;
    mount_weather(
        &weather,
        ResponseTemplate::new(200).set_body_json(weather_body(31.0, 35.0, 24.0, 0.0)),
    )
    .await;

    // Nothing listens on port 1
    let app = app_with(
        test_config(&weather.uri(), "http://127.0.0.1:1"),
        StubClassifier::returning(1),
    );

    let (status, body) = get(app, "/predict").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["water_plants"], 1);
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let weather = MockServer::start().await;
    let valve = MockServer::start().await;
    mount_valve_never_called(&valve).await;

    let classifier = StubClassifier::returning(1);
    let app = app_with(test_config(&weather.uri(), &valve.uri()), classifier.clone());

    let (status, body) = get(app, "/water-now").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Endpoint not found" }));
    assert_eq!(classifier.calls(), 0);
    valve.verify().await;
}

#[tokio::test]
async fn test_health_check() {
    let weather = MockServer::start().await;
    let app = app_with(
        test_config(&weather.uri(), "http://127.0.0.1:1"),
        StubClassifier::returning(0),
    );

    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["classifier"], "stub");
    assert_eq!(body["location"], "Coimbatore");
}

// ============================================================================
// Wiring from configuration
// ============================================================================

#[tokio::test]
async fn test_build_state_with_local_model() {
    let weather = MockServer::start().await;
    let valve = MockServer::start().await;
    mount_weather(
        &weather,
        ResponseTemplate::new(200).set_body_json(weather_body(34.0, 38.0, 27.0, 0.0)),
    )
    .await;
    mount_valve(&valve, "on", 200).await;

    // Water whenever precipitation is at or below 1 mm
    let mut model = tempfile::NamedTempFile::new().unwrap();
    write!(
        model,
        r#"{{
            "feature_names": ["precip", "temp_avg", "temp_max", "temp_min"],
            "trees": [ {{ "nodes": [
                {{ "feature": 0, "threshold": 1.0, "left": 1, "right": 2 }},
                {{ "class": 1 }},
                {{ "class": 0 }}
            ] }} ]
        }}"#
    )
    .unwrap();

    let mut config = test_config(&weather.uri(), &valve.uri());
    config.classifier.model_path = model.path().to_string_lossy().into_owned();

    let state = build_state(config).unwrap();
    assert_eq!(state.predictor.classifier_name(), "tree_ensemble");

    let (status, body) = get(create_app(state), "/predict").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["water_plants"], 1);
    valve.verify().await;
}

#[tokio::test]
async fn test_build_state_fails_without_model() {
    let mut config = test_config("http://127.0.0.1:1", "http://127.0.0.1:1");
    config.classifier.model_path = "/nonexistent/watering_model.json".to_string();

    assert!(build_state(config).is_err());
}
