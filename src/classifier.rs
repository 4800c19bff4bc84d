//! Client for the remote classification service.
//!
//! The service accepts the bare JSON array of feature values and answers
//! with a `character` label and a `confidence` score. Failures never touch
//! the drawing, so a submission can be retried as-is.

use crate::config::ClassifierSettings;
use crate::core::FeatureVector;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classifier endpoint configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Predict endpoint URL
    pub url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Extra attempts after a retryable failure
    pub retries: u32,
}

impl ClassifierConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
            retries: 0,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

impl From<&ClassifierSettings> for ClassifierConfig {
    fn from(settings: &ClassifierSettings) -> Self {
        Self {
            url: settings.url.clone(),
            timeout: settings.timeout,
            retries: settings.retries,
        }
    }
}

/// Classifier client error types.
#[derive(Debug)]
pub enum ClassifierError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned a non-success status
    Server { status: u16, message: String },
    /// Server answered but refused the input
    Rejected(String),
    /// Response body could not be understood
    Serialization(String),
}

impl ClassifierError {
    /// Whether a retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassifierError::Network(_) => true,
            ClassifierError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierError::Config(msg) => write!(f, "Classifier config error: {msg}"),
            ClassifierError::Network(msg) => write!(f, "Classifier network error: {msg}"),
            ClassifierError::Server { status, message } => {
                write!(f, "Classifier server error ({status}): {message}")
            }
            ClassifierError::Rejected(msg) => write!(f, "Classifier rejected input: {msg}"),
            ClassifierError::Serialization(msg) => {
                write!(f, "Classifier response error: {msg}")
            }
        }
    }
}

impl std::error::Error for ClassifierError {}

/// Raw response body from the predict endpoint.
#[derive(Debug, Clone, Deserialize)]
struct PredictResponse {
    character: Option<String>,
    confidence: Option<f64>,
    error: Option<String>,
}

/// Label and confidence returned by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted symbol
    pub character: String,
    /// Confidence as reported; `None` when the service omits it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.confidence {
            Some(confidence) => write!(f, "{} (confidence {confidence:.4})", self.character),
            None => write!(f, "{} (confidence not reported)", self.character),
        }
    }
}

impl TryFrom<PredictResponse> for Prediction {
    type Error = ClassifierError;

    fn try_from(response: PredictResponse) -> Result<Self, Self::Error> {
        if let Some(error) = response.error {
            return Err(ClassifierError::Rejected(error));
        }
        let character = response.character.ok_or_else(|| {
            ClassifierError::Serialization("response has no 'character' field".to_string())
        })?;
        Ok(Prediction {
            character,
            confidence: response.confidence,
        })
    }
}

/// Async client for the predict endpoint.
#[derive(Debug, Clone)]
pub struct ClassifierClient {
    config: ClassifierConfig,
    client: reqwest::Client,
}

impl ClassifierClient {
    /// Create a new classifier client.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        if config.url.trim().is_empty() {
            return Err(ClassifierError::Config("predict URL is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClassifierError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Submit one feature vector.
    pub async fn classify(&self, features: &FeatureVector) -> Result<Prediction, ClassifierError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(
            request_id = %request_id,
            url = %self.config.url,
            values = features.len(),
            "submitting features"
        );

        let response = self
            .client
            .post(&self.config.url)
            .header("X-Request-Id", &request_id)
            .json(features.as_slice())
            .send()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClassifierError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Serialization(e.to_string()))?;

        let prediction = Prediction::try_from(body)?;
        tracing::info!(request_id = %request_id, character = %prediction.character, "prediction received");
        Ok(prediction)
    }

    /// Submit with up to `config.retries` extra attempts on retryable errors.
    pub async fn classify_with_retry(
        &self,
        features: &FeatureVector,
    ) -> Result<Prediction, ClassifierError> {
        let mut attempt = 0;
        loop {
            match self.classify(features).await {
                Ok(prediction) => return Ok(prediction),
                Err(e) if e.is_retryable() && attempt < self.config.retries => {
                    attempt += 1;
                    tracing::warn!("Classifier attempt {attempt} failed: {e}; retrying");
                    tokio::time::sleep(Duration::from_millis(250 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Blocking classifier client for use in synchronous contexts.
#[derive(Debug)]
pub struct BlockingClassifierClient {
    inner: ClassifierClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingClassifierClient {
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ClassifierError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: ClassifierClient::new(config)?,
            runtime,
        })
    }

    pub fn classify(&self, features: &FeatureVector) -> Result<Prediction, ClassifierError> {
        self.runtime.block_on(self.inner.classify(features))
    }

    pub fn classify_with_retry(
        &self,
        features: &FeatureVector,
    ) -> Result<Prediction, ClassifierError> {
        self.runtime
            .block_on(self.inner.classify_with_retry(features))
    }

    pub fn config(&self) -> &ClassifierConfig {
        self.inner.config()
    }
}
