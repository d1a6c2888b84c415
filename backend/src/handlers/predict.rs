//! HTTP handler for the watering prediction endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::services::PredictionOutcome;
use crate::AppState;

/// Body of a successful `GET /predict`
///
/// `precipitation_mm` is always present, so even with the legacy `humidity`
/// key enabled the body carries one key more than the three older clients
/// were written against.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// 1 when the plants should be watered
    pub water_plants: u8,
    /// Current temperature in °C
    pub temperature: f64,
    pub precipitation_mm: f64,
    /// Precipitation again, under the name older clients read it from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
}

impl PredictResponse {
    pub fn from_outcome(outcome: &PredictionOutcome, legacy_humidity_field: bool) -> Self {
        let precipitation_mm = outcome.reading.precipitation_mm;
        Self {
            water_plants: outcome.decision.label(),
            temperature: outcome.reading.average_temperature_c,
            precipitation_mm,
            humidity: legacy_humidity_field.then_some(precipitation_mm),
        }
    }
}

/// Fetch weather, classify and switch the valve
pub async fn predict(State(state): State<AppState>) -> AppResult<Json<PredictResponse>> {
    let outcome = state.predictor.predict_and_actuate().await?;
    Ok(Json(PredictResponse::from_outcome(
        &outcome,
        state.config.response.legacy_humidity_field,
    )))
}
