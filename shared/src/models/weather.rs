//! Weather data models

use serde::{Deserialize, Serialize};

/// Weather snapshot for the configured location
///
/// All four values come from a single provider response. A response missing
/// any of them never produces a reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Current temperature, used as the day's average
    pub average_temperature_c: f64,
    /// Forecast maximum for the first forecast day
    pub max_temperature_c: f64,
    /// Forecast minimum for the first forecast day
    pub min_temperature_c: f64,
    /// Current precipitation in millimetres
    pub precipitation_mm: f64,
}

impl WeatherReading {
    pub fn new(
        average_temperature_c: f64,
        max_temperature_c: f64,
        min_temperature_c: f64,
        precipitation_mm: f64,
    ) -> Self {
        Self {
            average_temperature_c,
            max_temperature_c,
            min_temperature_c,
            precipitation_mm,
        }
    }
}
