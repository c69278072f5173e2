//! Client pipeline for a quantum random number generator service.
//!
//! The flow is the same one the original web consoles ran: validate the
//! user's parameters, call the backend, canonicalize whatever payload shape
//! comes back, then hand a schema-stable result to rendering and export.
//!
//! ```text
//! input -> request::GenerationRequest -> backend::QrngBackend
//!       -> normalize::normalize -> types::GenerationResult
//!       -> render / export
//! ```
//!
//! [`session::Session`] owns the "last result" slot and drives the cycle; the
//! `qrng` binary is a thin console adapter over it.

pub mod backend;
pub mod export;
pub mod normalize;
pub mod render;
pub mod request;
pub mod session;
pub mod types;

pub use crate::backend::{ClientConfig, ClientError, HttpBackend, QrngBackend, SimBackend};
pub use crate::request::{GenerationRequest, RequestPolicy, ValidationError};
pub use crate::session::{GenerateError, Session, SessionPhase};
pub use crate::types::{GenerationResult, HealthReport, Source, Statistics};
