//! HTTP handlers

mod health;
mod predict;

pub use health::*;
pub use predict::*;

use crate::error::AppError;

/// Fallback for unmatched routes
pub async fn not_found() -> AppError {
    AppError::RouteNotFound
}
