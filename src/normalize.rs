//! Canonicalizes loosely-shaped backend payloads.
//!
//! The generator service has drifted across deployments: statistics show up
//! under `statistics`, `stats`, or spread across the top level; metadata sits
//! at the top level or inside a `meta` object. Each field below is resolved by
//! an explicit ordered rule list so the rest of the crate only ever sees a
//! [`GenerationResult`].

use serde_json::Value;
use thiserror::Error;

use crate::render::compute_statistics;
use crate::types::{max_value, GenerationResult, HealthReport, Source, Statistics};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("backend reported status {status:?}: {message}")]
    InvalidStatus { status: String, message: String },
    #[error("payload has no usable numbers array")]
    MissingNumbers,
    #[error("numbers[{index}] is not a non-negative integer")]
    InvalidNumber { index: usize },
    #[error("payload contained no numbers")]
    EmptyNumbers,
    #[error("numbers[{index}] = {value} does not fit in {num_bits} bits")]
    ValueOutOfRange {
        index: usize,
        value: u64,
        num_bits: u8,
    },
}

/// Resolve a raw `/generate` payload into the canonical result.
///
/// `requested_num_bits` is the width the caller asked for; it is only used
/// when the payload does not echo a valid `num_bits` of its own.
pub fn normalize(
    payload: &Value,
    requested_num_bits: u8,
) -> Result<GenerationResult, NormalizationError> {
    check_status(payload)?;

    let numbers = extract_numbers(payload)?;
    let num_bits = resolve_num_bits(payload, requested_num_bits);

    let max = u64::from(max_value(num_bits));
    for (index, &value) in numbers.iter().enumerate() {
        if u64::from(value) > max {
            return Err(NormalizationError::ValueOutOfRange {
                index,
                value: u64::from(value),
                num_bits,
            });
        }
    }

    let statistics = extract_statistics(payload)
        .unwrap_or_else(|| compute_statistics(&numbers));

    Ok(GenerationResult {
        source: metadata_str(payload, "source")
            .map(|s| Source::from_label(&s))
            .unwrap_or_default(),
        timestamp: metadata_str(payload, "timestamp"),
        version: metadata_str(payload, "version"),
        entropy: metadata_f64(payload, "entropy"),
        numbers,
        num_bits,
        statistics,
    })
}

/// Resolve a `/health` payload. A payload without any `status` field still
/// counts as live; the request itself already succeeded.
pub fn health_report(payload: &Value) -> HealthReport {
    let live = match payload.get("status").and_then(Value::as_str) {
        Some(status) => is_success_marker(status),
        None => true,
    };
    let upstream = ["anu", "anu_available", "upstream"]
        .iter()
        .find_map(|key| boolish(payload.get(*key)?));
    HealthReport { live, upstream }
}

fn check_status(payload: &Value) -> Result<(), NormalizationError> {
    let Some(status) = payload.get("status").and_then(Value::as_str) else {
        return Ok(());
    };
    if is_success_marker(status) {
        return Ok(());
    }
    let message = payload
        .get("message")
        .or_else(|| payload.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("no detail provided")
        .to_string();
    Err(NormalizationError::InvalidStatus {
        status: status.to_string(),
        message,
    })
}

fn is_success_marker(status: &str) -> bool {
    matches!(status.to_ascii_lowercase().as_str(), "success" | "ok")
}

fn extract_numbers(payload: &Value) -> Result<Vec<u32>, NormalizationError> {
    let raw = payload
        .get("numbers")
        .and_then(Value::as_array)
        .ok_or(NormalizationError::MissingNumbers)?;
    if raw.is_empty() {
        return Err(NormalizationError::EmptyNumbers);
    }
    raw.iter()
        .enumerate()
        .map(|(index, value)| {
            value_as_uint(value)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or(NormalizationError::InvalidNumber { index })
        })
        .collect()
}

fn resolve_num_bits(payload: &Value, requested: u8) -> u8 {
    payload
        .get("num_bits")
        .and_then(value_as_uint)
        .filter(|&bits| (1..=16).contains(&bits))
        .map(|bits| bits as u8)
        .unwrap_or(requested)
}

/// Statistics extraction order: `statistics`, then `stats`, then the payload's
/// own top level. A candidate only wins if all four required fields parse.
fn extract_statistics(payload: &Value) -> Option<Statistics> {
    [payload.get("statistics"), payload.get("stats"), Some(payload)]
        .into_iter()
        .flatten()
        .find_map(statistics_from)
}

fn statistics_from(value: &Value) -> Option<Statistics> {
    Some(Statistics {
        mean: value.get("mean")?.as_f64()?,
        std: value.get("std")?.as_f64()?,
        min: value_as_uint(value.get("min")?).and_then(|v| u32::try_from(v).ok())?,
        max: value_as_uint(value.get("max")?).and_then(|v| u32::try_from(v).ok())?,
        range: value
            .get("range")
            .and_then(value_as_uint)
            .and_then(|v| u32::try_from(v).ok()),
    })
}

/// Top-level metadata wins over the nested `meta` object.
fn metadata_str(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .or_else(|| payload.get("meta")?.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn metadata_f64(payload: &Value, key: &str) -> Option<f64> {
    payload
        .get(key)
        .or_else(|| payload.get("meta")?.get(key))
        .and_then(Value::as_f64)
}

/// Accept both `3` and `3.0` as the integer 3; backends disagree on number
/// encoding.
fn value_as_uint(value: &Value) -> Option<u64> {
    if let Some(v) = value.as_u64() {
        return Some(v);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

fn boolish(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "up" | "ok" | "yes" | "1" => Some(true),
            "false" | "down" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
