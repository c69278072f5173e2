use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::backend::{ClientError, QrngBackend};
use crate::request::GenerationRequest;

/// Default request deadline. Generation against the upstream quantum source
/// can take a few seconds for large batches; ten covers it with margin.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How much of a non-JSON error body is kept for display.
const BODY_EXCERPT_LIMIT: usize = 200;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest-backed transport for the generator service.
#[derive(Debug)]
pub struct HttpBackend {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        url::Url::parse(&config.base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Unreachable(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ClientError {
        if error.is_timeout() {
            ClientError::Timeout(self.config.timeout)
        } else if error.is_decode() {
            ClientError::Decode(error.to_string())
        } else {
            ClientError::Unreachable(error.to_string())
        }
    }

    /// Turn a non-2xx response into `ServerError`, preferring the structured
    /// `error`/`message` field the service puts in failure bodies.
    async fn server_error(&self, response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let body_excerpt = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .or_else(|| v.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.chars().take(BODY_EXCERPT_LIMIT).collect());
        ClientError::ServerError {
            status,
            body_excerpt,
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let response = self
            .client
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        if !response.status().is_success() {
            return Err(self.server_error(response).await);
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| self.map_transport_error(e))
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let response = self
            .client
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        if !response.status().is_success() {
            return Err(self.server_error(response).await);
        }
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| self.map_transport_error(e))
    }
}

#[async_trait]
impl QrngBackend for HttpBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, ClientError> {
        tracing::debug!(
            num_bits = request.num_bits,
            num_samples = request.num_samples,
            "requesting generation"
        );
        let response = self
            .client
            .post(self.endpoint("/generate"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        if !response.status().is_success() {
            let error = self.server_error(response).await;
            tracing::warn!(%error, "generation request failed");
            return Err(error);
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| self.map_transport_error(e))
    }

    async fn health(&self) -> Result<Value, ClientError> {
        self.get_json("/health").await
    }

    async fn export_json(&self) -> Result<Vec<u8>, ClientError> {
        self.get_bytes("/export/json").await
    }

    async fn export_csv(&self) -> Result<Vec<u8>, ClientError> {
        self.get_bytes("/export/csv").await
    }
}
