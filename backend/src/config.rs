//! Configuration management for the Smart Irrigation relay
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with IRRIGATION_ prefix

use config::{ConfigError, Environment, File};
use reqwest::Url;
use serde::Deserialize;
use validator::{Validate, ValidationError};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_WEATHER_ENDPOINT: &str = "http://api.weatherapi.com/v1";
const DEFAULT_LOCATION: &str = "Coimbatore";
const DEFAULT_FORECAST_DAYS: u8 = 1;
const DEFAULT_WEATHER_TIMEOUT_SECS: u32 = 10;
const DEFAULT_ACTUATOR_URL: &str = "http://192.168.102.1";
const DEFAULT_ACTUATOR_TIMEOUT_SECS: u32 = 5;
const DEFAULT_MODEL_PATH: &str = "models/watering_model.json";
const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u32 = 10;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Weather provider configuration
    pub weather: WeatherConfig,

    /// Valve controller configuration
    pub actuator: ActuatorConfig,

    /// Classifier configuration
    pub classifier: ClassifierConfig,

    /// Response shape options
    pub response: ResponseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct WeatherConfig {
    /// WeatherAPI base URL, `forecast.json` is appended
    #[validate(custom = "validate_http_url")]
    pub api_endpoint: String,

    /// WeatherAPI key
    #[validate(length(min = 1, message = "weather.api_key must be set"))]
    pub api_key: String,

    /// Location name passed as the `q` parameter
    #[validate(custom = "validate_location")]
    pub location: String,

    /// Forecast days requested; only the first day is read
    #[validate(range(min = 1, max = 14))]
    pub forecast_days: u8,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct ActuatorConfig {
    /// Base URL of the valve controller, e.g. `http://192.168.102.1`
    #[validate(custom = "validate_http_url")]
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Where predictions come from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierBackend {
    /// Tree ensemble artifact evaluated in process
    #[default]
    Local,
    /// HTTP inference service
    Remote,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    pub backend: ClassifierBackend,

    /// Path to the tree ensemble artifact (local backend)
    pub model_path: String,

    /// Inference endpoint (remote backend)
    pub endpoint: Option<String>,

    /// Sent as `x-api-key` to the inference endpoint
    pub api_key: Option<String>,

    /// Request timeout in seconds (remote backend)
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResponseConfig {
    /// Also emit precipitation under the legacy `humidity` key
    pub legacy_humidity_field: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("IRRIGATION_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("weather.api_endpoint", DEFAULT_WEATHER_ENDPOINT)?
            .set_default("weather.api_key", "")?
            .set_default("weather.location", DEFAULT_LOCATION)?
            .set_default("weather.forecast_days", i64::from(DEFAULT_FORECAST_DAYS))?
            .set_default("weather.timeout_secs", i64::from(DEFAULT_WEATHER_TIMEOUT_SECS))?
            .set_default("actuator.base_url", DEFAULT_ACTUATOR_URL)?
            .set_default("actuator.timeout_secs", i64::from(DEFAULT_ACTUATOR_TIMEOUT_SECS))?
            .set_default("classifier.backend", "local")?
            .set_default("classifier.model_path", DEFAULT_MODEL_PATH)?
            .set_default("classifier.timeout_secs", i64::from(DEFAULT_CLASSIFIER_TIMEOUT_SECS))?
            .set_default("response.legacy_humidity_field", true)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (IRRIGATION__ prefix).
            // Values stay strings so numeric-looking secrets are not rewritten.
            .add_source(Environment::with_prefix("IRRIGATION").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialization alone cannot enforce
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weather
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid weather config: {}", e)))?;
        self.actuator
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid actuator config: {}", e)))?;

        // A zero timeout fails every request immediately
        let timeouts = [
            ("weather.timeout_secs", self.weather.timeout_secs),
            ("actuator.timeout_secs", self.actuator.timeout_secs),
            ("classifier.timeout_secs", self.classifier.timeout_secs),
        ];
        if let Some((key, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Message(format!("{} must be at least 1", key)));
        }

        match self.classifier.backend {
            ClassifierBackend::Local if self.classifier.model_path.trim().is_empty() => Err(
                ConfigError::Message("classifier.model_path must be set".to_string()),
            ),
            ClassifierBackend::Remote => match self.classifier.endpoint.as_deref() {
                Some(endpoint) => parse_http_url(endpoint)
                    .map(|_| ())
                    .map_err(|e| ConfigError::Message(format!("classifier.endpoint: {}", e))),
                None => Err(ConfigError::Message(
                    "classifier.endpoint must be set for the remote backend".to_string(),
                )),
            },
            ClassifierBackend::Local => Ok(()),
        }
    }
}

/// Parse an absolute http(s) URL with a host
pub fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("'{}' is not a valid URL: {}", raw, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("'{}' must use http or https", raw));
    }
    if !url.has_host() {
        return Err(format!("'{}' has no host", raw));
    }
    Ok(url)
}

fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    parse_http_url(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("http_url"))
}

fn validate_location(value: &str) -> Result<(), ValidationError> {
    shared::validate_location_name(value).map_err(|_| ValidationError::new("location"))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_WEATHER_ENDPOINT.to_string(),
            api_key: String::new(),
            location: DEFAULT_LOCATION.to_string(),
            forecast_days: DEFAULT_FORECAST_DAYS,
            timeout_secs: u64::from(DEFAULT_WEATHER_TIMEOUT_SECS),
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ACTUATOR_URL.to_string(),
            timeout_secs: u64::from(DEFAULT_ACTUATOR_TIMEOUT_SECS),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Local,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            endpoint: None,
            api_key: None,
            timeout_secs: u64::from(DEFAULT_CLASSIFIER_TIMEOUT_SECS),
        }
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            legacy_humidity_field: true,
        }
    }
}
