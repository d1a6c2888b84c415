//! Valve controller client
//!
//! The controller (an ESP32 driving a solenoid valve) exposes
//! `POST /toggle_valve?state=on|off` and answers with a bare status code.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use shared::ValveState;

use crate::config::{parse_http_url, ActuatorConfig};
use crate::error::{AppError, AppResult};

/// Something that can open or close the water valve
#[async_trait]
pub trait ValveActuator: Send + Sync {
    /// Send one command. Failures are `ActuationFailed`.
    async fn set_state(&self, state: ValveState) -> AppResult<()>;
}

/// HTTP client for the valve controller
#[derive(Clone)]
pub struct ValveClient {
    http_client: Client,
    toggle_url: Url,
}

impl ValveClient {
    /// Create a client for the controller at `config.base_url`
    pub fn new(config: &ActuatorConfig) -> AppResult<Self> {
        let toggle_url = Self::toggle_url(&config.base_url)?;
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Valve HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            toggle_url,
        })
    }

    /// `{base_url}/toggle_valve`, keeping any path prefix on the base
    fn toggle_url(base_url: &str) -> AppResult<Url> {
        let mut base = parse_http_url(base_url)
            .map_err(|e| AppError::Configuration(format!("actuator.base_url: {}", e)))?;

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        base.join("toggle_valve")
            .map_err(|e| AppError::Configuration(format!("actuator.base_url: {}", e)))
    }

    pub fn endpoint(&self) -> &Url {
        &self.toggle_url
    }

    /// Switch the valve on or off
    #[tracing::instrument(skip(self), fields(endpoint = %self.toggle_url))]
    pub async fn toggle(&self, state: ValveState) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.toggle_url.clone())
            .query(&[("state", state.as_str())])
            .send()
            .await
            .map_err(|e| AppError::ActuationFailed(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ActuationFailed(format!(
                "Controller returned {}",
                response.status()
            )));
        }

        tracing::info!("Valve successfully turned {}", state);
        Ok(())
    }
}

#[async_trait]
impl ValveActuator for ValveClient {
    async fn set_state(&self, state: ValveState) -> AppResult<()> {
        self.toggle(state).await
    }
}
