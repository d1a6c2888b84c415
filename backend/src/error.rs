//! Error handling for the Smart Irrigation relay
//!
//! Client-facing bodies are fixed, generic messages. The detail carried by
//! each variant is logged and never sent back.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Pipeline errors
    #[error("Weather data unavailable: {0}")]
    WeatherUnavailable(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    #[error("Valve actuation failed: {0}")]
    ActuationFailed(String),

    // Routing errors
    #[error("Endpoint not found")]
    RouteNotFound,

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::WeatherUnavailable(_) | AppError::PredictionFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ActuationFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::Configuration(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the client
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::WeatherUnavailable(_) => "Failed to fetch weather data",
            AppError::PredictionFailed(_) => "Prediction failed",
            AppError::ActuationFailed(_) => "Valve actuation failed",
            AppError::RouteNotFound => "Endpoint not found",
            AppError::Configuration(_) | AppError::InternalError(_) => {
                "An internal server error occurred"
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Error: {:?}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.public_message().to_string(),
            }),
        )
            .into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
