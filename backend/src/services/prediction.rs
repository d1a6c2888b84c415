//! Predict-and-actuate pipeline
//!
//! One call runs weather → features → classifier → valve. Weather and
//! classifier failures end the request; a valve failure is logged and the
//! decision is still returned.

use std::sync::Arc;

use serde::Serialize;
use shared::{FeatureVector, IrrigationDecision, Location, WeatherReading};

use crate::error::{AppError, AppResult};
use crate::external::{ValveActuator, WeatherSource};
use crate::services::classifier::Classifier;

/// Whether the valve command reached the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuationStatus {
    Applied,
    Failed,
}

/// Result of one prediction cycle
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    pub reading: WeatherReading,
    pub features: FeatureVector,
    pub decision: IrrigationDecision,
    pub actuation: ActuationStatus,
}

/// Runs prediction cycles against the configured collaborators
#[derive(Clone)]
pub struct PredictionService {
    weather: Arc<dyn WeatherSource>,
    classifier: Arc<dyn Classifier>,
    valve: Arc<dyn ValveActuator>,
    location: Location,
}

impl PredictionService {
    pub fn new(
        weather: Arc<dyn WeatherSource>,
        classifier: Arc<dyn Classifier>,
        valve: Arc<dyn ValveActuator>,
        location: Location,
    ) -> Self {
        Self {
            weather,
            classifier,
            valve,
            location,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    /// Decide whether to water now and drive the valve accordingly
    #[tracing::instrument(skip(self), fields(location = %self.location))]
    pub async fn predict_and_actuate(&self) -> AppResult<PredictionOutcome> {
        let reading = self
            .weather
            .fetch_reading(&self.location)
            .await
            .map_err(|e| match e {
                AppError::WeatherUnavailable(_) => e,
                other => AppError::WeatherUnavailable(other.to_string()),
            })?;

        let features = FeatureVector::from(&reading);

        let label = self
            .classifier
            .predict(&features)
            .await
            .map_err(|e| AppError::PredictionFailed(e.to_string()))?;

        let decision = IrrigationDecision::from_label(label).ok_or_else(|| {
            AppError::PredictionFailed(format!("classifier returned unusable label {}", label))
        })?;

        tracing::info!(
            should_water = decision.should_water,
            temp_avg = features.temp_avg,
            precip = features.precip,
            "Irrigation decision made"
        );

        let state = decision.valve_state();
        let actuation = match self.valve.set_state(state).await {
            Ok(()) => ActuationStatus::Applied,
            Err(e) => {
                tracing::warn!("Failed to turn valve {}: {}", state, e);
                ActuationStatus::Failed
            }
        };

        Ok(PredictionOutcome {
            reading,
            features,
            decision,
            actuation,
        })
    }
}
