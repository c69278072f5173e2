use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard ceiling on `num_bits`; the backend samples at most 16-bit units.
pub const MAX_BITS: u8 = 16;

/// Default ceiling on `num_samples`, matching the backend's own limit.
pub const DEFAULT_MAX_SAMPLES: u32 = 5_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must be a whole number (got {value:?})")]
    NotANumber { field: &'static str, value: String },
    #[error("num_bits must be 1..=16 (got {0})")]
    BitsOutOfRange(i64),
    #[error("num_samples must be 1..={max} (got {value})")]
    SamplesOutOfRange { value: i64, max: u32 },
}

/// Caps applied before a request leaves the client. Deployments that front the
/// stricter simulator-only backend lower `max_samples` to 1000.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestPolicy {
    pub max_samples: u32,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

impl RequestPolicy {
    pub fn with_max_samples(max_samples: u32) -> Self {
        Self { max_samples }
    }
}

/// A validated generation request. Serializes to the wire body
/// `{"num_bits": .., "num_samples": ..}` expected by `POST /generate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub num_bits: u8,
    pub num_samples: u32,
}

impl GenerationRequest {
    /// Validate already-typed parameters against the policy.
    pub fn new(num_bits: i64, num_samples: i64, policy: &RequestPolicy) -> Result<Self, ValidationError> {
        if !(1..=i64::from(MAX_BITS)).contains(&num_bits) {
            return Err(ValidationError::BitsOutOfRange(num_bits));
        }
        if !(1..=i64::from(policy.max_samples)).contains(&num_samples) {
            return Err(ValidationError::SamplesOutOfRange {
                value: num_samples,
                max: policy.max_samples,
            });
        }
        Ok(Self {
            num_bits: num_bits as u8,
            num_samples: num_samples as u32,
        })
    }

    /// Parse free-form user input (form fields, CLI strings). Pure; never
    /// touches the network.
    pub fn parse(
        raw_bits: &str,
        raw_samples: &str,
        policy: &RequestPolicy,
    ) -> Result<Self, ValidationError> {
        let num_bits = parse_int("num_bits", raw_bits)?;
        let num_samples = parse_int("num_samples", raw_samples)?;
        Self::new(num_bits, num_samples, policy)
    }
}

fn parse_int(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: raw.to_string(),
        })
}
