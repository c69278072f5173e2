use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::request::GenerationRequest;

pub mod http;
pub mod sim;

pub use http::{ClientConfig, HttpBackend};
pub use sim::SimBackend;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("server returned HTTP {status}: {body_excerpt}")]
    ServerError { status: u16, body_excerpt: String },
    #[error("could not decode backend response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Transport seam for the generator service. The HTTP implementation talks to
/// the real backend; the simulator produces the same payload shapes in
/// process, for offline runs and tests.
#[async_trait]
pub trait QrngBackend: Send + Sync {
    /// `POST /generate`. Returns the raw payload; shaping it into a canonical
    /// result is the normalizer's job, not the transport's.
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, ClientError>;

    /// `GET /health`.
    async fn health(&self) -> Result<Value, ClientError>;

    /// `GET /export/json`: the server's own export of its last generation.
    async fn export_json(&self) -> Result<Vec<u8>, ClientError>;

    /// `GET /export/csv`.
    async fn export_csv(&self) -> Result<Vec<u8>, ClientError>;
}
