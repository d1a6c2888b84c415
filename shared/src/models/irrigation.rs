//! Irrigation decision models
//!
//! The classifier was trained on a frame with the columns `precip`,
//! `temp_avg`, `temp_max` and `temp_min`, in that order. [`FeatureVector`]
//! fixes that order; changing it silently corrupts every prediction.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::WeatherReading;

/// Number of classifier input features
pub const FEATURE_COUNT: usize = 4;

/// Feature names in the order the classifier expects them
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["precip", "temp_avg", "temp_max", "temp_min"];

/// Classifier input built from a [`WeatherReading`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub precip: f64,
    pub temp_avg: f64,
    pub temp_max: f64,
    pub temp_min: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_NAMES`] order
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [self.precip, self.temp_avg, self.temp_max, self.temp_min]
    }

    /// True when every value is a finite number
    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite())
    }
}

impl From<&WeatherReading> for FeatureVector {
    fn from(reading: &WeatherReading) -> Self {
        Self {
            precip: reading.precipitation_mm,
            temp_avg: reading.average_temperature_c,
            temp_max: reading.max_temperature_c,
            temp_min: reading.min_temperature_c,
        }
    }
}

/// Whether the plants should be watered now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrigationDecision {
    pub should_water: bool,
}

impl IrrigationDecision {
    /// Map a binary classifier label. Anything other than 0 or 1 is unusable.
    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Self {
                should_water: false,
            }),
            1 => Some(Self { should_water: true }),
            _ => None,
        }
    }

    pub fn label(&self) -> u8 {
        u8::from(self.should_water)
    }

    pub fn valve_state(&self) -> ValveState {
        if self.should_water {
            ValveState::On
        } else {
            ValveState::Off
        }
    }
}

/// Command sent to the valve controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValveState {
    On,
    Off,
}

impl ValveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValveState::On => "on",
            ValveState::Off => "off",
        }
    }
}

impl fmt::Display for ValveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
