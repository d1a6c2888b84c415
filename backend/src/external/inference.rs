//! Remote inference client
//!
//! Client for a hosted watering classifier. Used instead of the in-process
//! tree ensemble when `classifier.backend = "remote"`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::FeatureVector;

use crate::config::ClassifierConfig;
use crate::error::{AppError, AppResult};
use crate::services::classifier::{Classifier, ClassifierError};

/// Client for the inference microservice
#[derive(Clone)]
pub struct RemoteClassifier {
    api_endpoint: String,
    api_key: Option<String>,
    http_client: Client,
}

/// Request to classify one sample
#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub features: &'a FeatureVector,
}

/// Response from the inference API
#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub prediction: i64,
}

impl RemoteClassifier {
    /// Create a new inference client
    pub fn new(config: &ClassifierConfig) -> AppResult<Self> {
        let api_endpoint = config.endpoint.clone().ok_or_else(|| {
            AppError::Configuration("classifier.endpoint is not set".to_string())
        })?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Inference HTTP client: {}", e)))?;

        Ok(Self {
            api_endpoint,
            api_key: config.api_key.clone(),
            http_client,
        })
    }

    /// Send one sample for classification
    pub async fn classify(&self, features: &FeatureVector) -> Result<u8, ClassifierError> {
        let mut request = self
            .http_client
            .post(&self.api_endpoint)
            .json(&PredictRequest { features });
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClassifierError::Remote(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClassifierError::Remote(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let result: PredictResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Remote(format!("Failed to parse response: {}", e)))?;

        Self::parse_label(result.prediction)
    }

    /// Only 0 and 1 are meaningful labels
    pub fn parse_label(prediction: i64) -> Result<u8, ClassifierError> {
        match prediction {
            0 => Ok(0),
            1 => Ok(1),
            other => Err(ClassifierError::Remote(format!(
                "unexpected prediction {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError> {
        self.classify(features).await
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
