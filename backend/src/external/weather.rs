//! Weather API client for fetching irrigation inputs
//!
//! Integrates with WeatherAPI (`forecast.json`): current temperature and
//! precipitation, plus the first forecast day's min/max temperature.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::{validate_reading, Location, WeatherReading};

use crate::config::WeatherConfig;
use crate::error::{AppError, AppResult};

/// Source of weather readings for the prediction pipeline
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch one reading for `location`. Any failure is `WeatherUnavailable`.
    async fn fetch_reading(&self, location: &Location) -> AppResult<WeatherReading>;
}

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
    forecast_days: u8,
}

/// WeatherAPI response for `forecast.json`
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
    forecast: ForecastBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f64,
    precip_mm: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastBlock {
    forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    day: DaySummary,
}

#[derive(Debug, Deserialize)]
struct DaySummary {
    maxtemp_c: f64,
    mintemp_c: f64,
}

impl WeatherClient {
    /// Create a new WeatherClient
    pub fn new(config: &WeatherConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Weather HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
            forecast_days: config.forecast_days,
        })
    }

    fn forecast_url(&self) -> String {
        format!("{}/forecast.json", self.base_url)
    }

    /// Fetch the current reading for a location
    #[tracing::instrument(skip(self, location), fields(location = %location))]
    pub async fn get_reading(&self, location: &Location) -> AppResult<WeatherReading> {
        let days = self.forecast_days.to_string();

        // without_url keeps the API key out of error messages
        let response = self
            .client
            .get(self.forecast_url())
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", location.as_str()),
                ("days", days.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::WeatherUnavailable(format!(
                    "Weather API request failed: {}",
                    e.without_url()
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::WeatherUnavailable(format!(
                "Weather API error: {} - {}",
                status, body
            )));
        }

        let data: ForecastResponse = response.json().await.map_err(|e| {
            AppError::WeatherUnavailable(format!(
                "Failed to parse weather response: {}",
                e.without_url()
            ))
        })?;

        let reading = Self::convert_response(data)?;
        tracing::debug!(?reading, "Weather reading received");
        Ok(reading)
    }

    /// Convert a WeatherAPI response to a reading, all fields or nothing
    fn convert_response(data: ForecastResponse) -> AppResult<WeatherReading> {
        let today = data.forecast.forecastday.first().ok_or_else(|| {
            AppError::WeatherUnavailable("Weather response has no forecast days".to_string())
        })?;

        let reading = WeatherReading {
            average_temperature_c: data.current.temp_c,
            max_temperature_c: today.day.maxtemp_c,
            min_temperature_c: today.day.mintemp_c,
            precipitation_mm: data.current.precip_mm,
        };

        validate_reading(&reading).map_err(|e| AppError::WeatherUnavailable(e.to_string()))?;
        Ok(reading)
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    async fn fetch_reading(&self, location: &Location) -> AppResult<WeatherReading> {
        self.get_reading(location).await
    }
}
