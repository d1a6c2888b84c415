//! Route definitions for the Smart Irrigation relay

use axum::{routing::get, Router};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/predict", get(handlers::predict))
        .route("/health", get(handlers::health_check))
}
