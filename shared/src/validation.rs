//! Validation utilities for weather inputs

use crate::models::WeatherReading;

/// Upper bound on a location name, well above any real place name
pub const MAX_LOCATION_LENGTH: usize = 128;

/// Validate a location name sent to the weather provider
pub fn validate_location_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Location name cannot be empty");
    }
    if name.chars().count() > MAX_LOCATION_LENGTH {
        return Err("Location name is too long");
    }
    if name.chars().any(char::is_control) {
        return Err("Location name cannot contain control characters");
    }
    Ok(())
}

/// Validate a reading decoded from the weather provider.
///
/// Values are only checked, never adjusted.
pub fn validate_reading(reading: &WeatherReading) -> Result<(), &'static str> {
    let values = [
        reading.average_temperature_c,
        reading.max_temperature_c,
        reading.min_temperature_c,
        reading.precipitation_mm,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err("Weather values must be finite numbers");
    }
    if reading.precipitation_mm < 0.0 {
        return Err("Precipitation cannot be negative");
    }
    Ok(())
}
