//! Smart Irrigation relay - backend
//!
//! Answers `GET /predict` by fetching the weather for a configured location,
//! asking a pre-trained classifier whether to water, and switching a remote
//! valve to match.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use shared::Location;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use crate::config::Config;

use crate::config::ClassifierBackend;
use crate::external::{RemoteClassifier, ValveClient, WeatherClient};
use crate::services::{Classifier, PredictionService, TreeEnsemble};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub predictor: Arc<PredictionService>,
}

impl AppState {
    pub fn new(config: Config, predictor: PredictionService) -> Self {
        Self {
            config: Arc::new(config),
            predictor: Arc::new(predictor),
        }
    }
}

/// Build the classifier chosen by `classifier.backend`
pub fn build_classifier(config: &Config) -> anyhow::Result<Arc<dyn Classifier>> {
    match config.classifier.backend {
        ClassifierBackend::Local => {
            let model = TreeEnsemble::load(&config.classifier.model_path).with_context(|| {
                format!(
                    "failed to load classifier from {}",
                    config.classifier.model_path
                )
            })?;
            tracing::info!(
                "Loaded tree ensemble with {} tree(s) from {}",
                model.tree_count(),
                config.classifier.model_path
            );
            Ok(Arc::new(model))
        }
        ClassifierBackend::Remote => Ok(Arc::new(RemoteClassifier::new(&config.classifier)?)),
    }
}

/// Wire every collaborator from configuration
pub fn build_state(config: Config) -> anyhow::Result<AppState> {
    let location = Location::new(config.weather.location.as_str())
        .map_err(|e| anyhow::anyhow!("invalid weather.location: {}", e))?;
    let weather = WeatherClient::new(&config.weather)?;
    let valve = ValveClient::new(&config.actuator)?;
    let classifier = build_classifier(&config)?;

    let predictor = PredictionService::new(
        Arc::new(weather),
        classifier,
        Arc::new(valve),
        location,
    );

    Ok(AppState::new(config, predictor))
}

/// Bind the listening socket; `host` may be an IP address or a hostname
pub async fn bind_listener(host: &str, port: u16) -> anyhow::Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {}:{}", host, port))
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::api_routes())
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
