//! Ties the pipeline together: validate, call the backend, normalize, and own
//! the single "last result" slot that rendering and export read from.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::backend::{ClientError, QrngBackend};
use crate::export::{self, ExportError};
use crate::normalize::{self, NormalizationError};
use crate::render::NumberBase;
use crate::request::{GenerationRequest, RequestPolicy, ValidationError};
use crate::types::{GenerationResult, HealthReport, Source};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("a generation request is already in flight")]
    Busy,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

/// Which half of the request cycle the session is in. The presentation layer
/// disables its trigger while `Requesting`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Requesting,
}

/// One line of the generation history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRecord {
    pub at: DateTime<Utc>,
    pub num_bits: u8,
    pub num_samples: u32,
    pub source: Source,
}

/// Server-side export formats (`GET /export/*`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerExportFormat {
    Json,
    Csv,
}

pub struct Session {
    backend: Arc<dyn QrngBackend>,
    policy: RequestPolicy,
    phase: SessionPhase,
    last: Option<GenerationResult>,
    history: Vec<GenerationRecord>,
}

impl Session {
    pub fn new(backend: Arc<dyn QrngBackend>, policy: RequestPolicy) -> Self {
        Self {
            backend,
            policy,
            phase: SessionPhase::Idle,
            last: None,
            history: Vec::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn policy(&self) -> &RequestPolicy {
        &self.policy
    }

    /// The most recent successful result, if any.
    pub fn last(&self) -> Option<&GenerationResult> {
        self.last.as_ref()
    }

    pub fn history(&self) -> &[GenerationRecord] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Validate raw user input, then run the full cycle.
    pub async fn generate_from_input(
        &mut self,
        raw_bits: &str,
        raw_samples: &str,
    ) -> Result<&GenerationResult, GenerateError> {
        let request = GenerationRequest::parse(raw_bits, raw_samples, &self.policy)?;
        self.generate(request).await
    }

    /// Run one request/normalize cycle. On success the last-result slot is
    /// replaced wholesale; on any failure it is left exactly as it was.
    pub async fn generate(
        &mut self,
        request: GenerationRequest,
    ) -> Result<&GenerationResult, GenerateError> {
        if self.phase == SessionPhase::Requesting {
            return Err(GenerateError::Busy);
        }
        self.phase = SessionPhase::Requesting;
        let outcome = self.run_cycle(&request).await;
        self.phase = SessionPhase::Idle;

        let result = outcome?;
        tracing::info!(
            num_bits = result.num_bits,
            count = result.numbers.len(),
            source = result.source.label(),
            "generation complete"
        );
        self.history.push(GenerationRecord {
            at: Utc::now(),
            num_bits: result.num_bits,
            num_samples: request.num_samples,
            source: result.source,
        });
        Ok(self.last.insert(result))
    }

    async fn run_cycle(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerateError> {
        let payload = self.backend.generate(request).await?;
        let result = normalize::normalize(&payload, request.num_bits)?;
        Ok(result)
    }

    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        let payload = self.backend.health().await?;
        Ok(normalize::health_report(&payload))
    }

    /// The server's own export of its last generation.
    pub async fn fetch_server_export(
        &self,
        format: ServerExportFormat,
    ) -> Result<Vec<u8>, ClientError> {
        match format {
            ServerExportFormat::Json => self.backend.export_json().await,
            ServerExportFormat::Csv => self.backend.export_csv().await,
        }
    }

    /// Client-side JSON export of the held result.
    pub fn export_last_json(&self) -> Result<String, ExportError> {
        let result = self.last.as_ref().ok_or(ExportError::NoResult)?;
        export::to_json(result)
    }

    /// Client-side CSV export of the held result.
    pub fn export_last_csv(&self) -> Result<String, ExportError> {
        let result = self.last.as_ref().ok_or(ExportError::NoResult)?;
        Ok(export::to_csv(result))
    }

    /// One formatted number per line, for the clipboard.
    pub fn clipboard_text(&self, base: NumberBase) -> Result<String, ExportError> {
        let result = self.last.as_ref().ok_or(ExportError::NoResult)?;
        Ok(export::to_clipboard_text(result, base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimBackend;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    /// Backend that always fails, for exercising the failure paths.
    struct FailingBackend;

    #[async_trait]
    impl QrngBackend for FailingBackend {
        async fn generate(&self, _request: &GenerationRequest) -> Result<Value, ClientError> {
            Err(ClientError::ServerError {
                status: 500,
                body_excerpt: "upstream timeout".to_string(),
            })
        }

        async fn health(&self) -> Result<Value, ClientError> {
            Err(ClientError::Unreachable("connection refused".to_string()))
        }

        async fn export_json(&self) -> Result<Vec<u8>, ClientError> {
            Err(ClientError::Unreachable("connection refused".to_string()))
        }

        async fn export_csv(&self) -> Result<Vec<u8>, ClientError> {
            Err(ClientError::Unreachable("connection refused".to_string()))
        }
    }

    fn request(num_bits: i64, num_samples: i64) -> GenerationRequest {
        GenerationRequest::new(num_bits, num_samples, &RequestPolicy::default()).unwrap()
    }

    #[tokio::test]
    async fn success_replaces_the_slot_and_appends_history() {
        let mut session = Session::new(Arc::new(SimBackend::new(3)), RequestPolicy::default());
        assert!(session.last().is_none());

        session.generate(request(8, 10)).await.unwrap();
        let first = session.last().unwrap().clone();
        assert_eq!(first.numbers.len(), 10);

        session.generate(request(4, 5)).await.unwrap();
        let second = session.last().unwrap();
        assert_eq!(second.num_bits, 4);
        assert_eq!(second.numbers.len(), 5);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].num_samples, 10);

        session.clear_history();
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn failure_leaves_the_previous_result_in_place() {
        let mut session = Session::new(Arc::new(SimBackend::new(3)), RequestPolicy::default());
        session.generate(request(8, 10)).await.unwrap();
        let before = session.last().unwrap().clone();

        let mut failing = Session::new(Arc::new(FailingBackend), RequestPolicy::default());
        let err = failing.generate(request(8, 10)).await.unwrap_err();
        match err {
            GenerateError::Client(ClientError::ServerError {
                status,
                body_excerpt,
            }) => {
                assert_eq!(status, 500);
                assert_eq!(body_excerpt, "upstream timeout");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(failing.last().is_none());

        // The healthy session still holds its result untouched.
        assert_eq!(session.last().unwrap(), &before);
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_backend() {
        // FailingBackend would error loudly if it were ever called.
        let mut session = Session::new(Arc::new(FailingBackend), RequestPolicy::default());
        let err = session.generate_from_input("20", "10").await.unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Validation(ValidationError::BitsOutOfRange(20))
        ));
        let err = session.generate_from_input("8", "lots").await.unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Validation(ValidationError::NotANumber { .. })
        ));
    }

    #[tokio::test]
    async fn exports_demand_a_held_result() {
        let mut session = Session::new(Arc::new(SimBackend::new(9)), RequestPolicy::default());
        assert!(matches!(
            session.export_last_json(),
            Err(ExportError::NoResult)
        ));
        assert!(matches!(
            session.clipboard_text(NumberBase::Binary),
            Err(ExportError::NoResult)
        ));

        session.generate(request(8, 4)).await.unwrap();
        let csv = session.export_last_csv().unwrap();
        assert!(csv.starts_with("index,decimal,binary\n"));
        assert_eq!(csv.lines().count(), 5);
        let clipboard = session.clipboard_text(NumberBase::Binary).unwrap();
        assert_eq!(clipboard.lines().count(), 4);
        assert!(clipboard.lines().all(|line| line.len() == 8));
    }

    #[tokio::test]
    async fn health_is_normalized() {
        let session = Session::new(Arc::new(SimBackend::new(1)), RequestPolicy::default());
        let report = session.health().await.unwrap();
        assert!(report.live);
        assert_eq!(report.upstream, Some(false));
    }
}
