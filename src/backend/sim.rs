use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::sync::Mutex;

use crate::backend::{ClientError, QrngBackend};
use crate::render::compute_statistics;
use crate::request::GenerationRequest;
use crate::types::max_value;

/// In-process stand-in for the generator service.
///
/// Emits the same payload shape as the real backend's simulator fallback, so
/// everything downstream (normalizer included) is exercised against the
/// genuine wire format. Seeded, so demos and tests are reproducible.
pub struct SimBackend {
    rng: Mutex<StdRng>,
    last_generation: Mutex<Option<Value>>,
}

impl SimBackend {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            last_generation: Mutex::new(None),
        }
    }

    fn last_payload(&self) -> Result<Value, ClientError> {
        self.last_generation
            .lock()
            .unwrap()
            .clone()
            .ok_or(ClientError::ServerError {
                status: 404,
                body_excerpt: "nothing generated yet".to_string(),
            })
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl QrngBackend for SimBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, ClientError> {
        let max = max_value(request.num_bits);
        let numbers: Vec<u32> = {
            let mut rng = self.rng.lock().unwrap();
            (0..request.num_samples)
                .map(|_| rng.gen_range(0..=max))
                .collect()
        };
        let stats = compute_statistics(&numbers);

        let payload = json!({
            "status": "success",
            "source": "SIMULATOR",
            "num_bits": request.num_bits,
            "num_samples": request.num_samples,
            "numbers": numbers,
            "statistics": {
                "mean": stats.mean,
                "std": stats.std,
                "min": stats.min,
                "max": stats.max,
            }
        });
        *self.last_generation.lock().unwrap() = Some(payload.clone());
        Ok(payload)
    }

    async fn health(&self) -> Result<Value, ClientError> {
        Ok(json!({"status": "ok", "anu_available": false}))
    }

    async fn export_json(&self) -> Result<Vec<u8>, ClientError> {
        let payload = self.last_payload()?;
        serde_json::to_vec_pretty(&payload).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn export_csv(&self) -> Result<Vec<u8>, ClientError> {
        let payload = self.last_payload()?;
        let mut out = String::from("index,value\n");
        if let Some(numbers) = payload.get("numbers").and_then(Value::as_array) {
            for (index, n) in numbers.iter().enumerate() {
                out.push_str(&format!("{index},{n}\n"));
            }
        }
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::request::RequestPolicy;
    use crate::types::Source;

    fn request(num_bits: i64, num_samples: i64) -> GenerationRequest {
        GenerationRequest::new(num_bits, num_samples, &RequestPolicy::default()).unwrap()
    }

    #[tokio::test]
    async fn payload_normalizes_and_respects_the_bit_width() {
        let backend = SimBackend::new(7);
        let payload = backend.generate(&request(4, 200)).await.unwrap();
        let result = normalize(&payload, 4).unwrap();
        assert_eq!(result.num_bits, 4);
        assert_eq!(result.numbers.len(), 200);
        assert_eq!(result.source, Source::Simulator);
        assert!(result.numbers.iter().all(|&n| n <= 15));
    }

    #[tokio::test]
    async fn same_seed_reproduces_the_same_batch() {
        let a = SimBackend::new(42).generate(&request(8, 16)).await.unwrap();
        let b = SimBackend::new(42).generate(&request(8, 16)).await.unwrap();
        assert_eq!(a["numbers"], b["numbers"]);
    }

    #[tokio::test]
    async fn export_requires_a_prior_generation() {
        let backend = SimBackend::new(1);
        let err = backend.export_json().await.unwrap_err();
        assert_eq!(err.status(), Some(404));

        backend.generate(&request(8, 3)).await.unwrap();
        let bytes = backend.export_json().await.unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["source"], "SIMULATOR");

        let csv = String::from_utf8(backend.export_csv().await.unwrap()).unwrap();
        assert!(csv.starts_with("index,value\n"));
        assert_eq!(csv.lines().count(), 4);
    }
}
