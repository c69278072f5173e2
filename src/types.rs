use serde::{Deserialize, Serialize};

/// Where the backend says the randomness came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "ANU")]
    Anu,
    #[serde(rename = "SIMULATOR")]
    Simulator,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl Source {
    /// Parse a wire label. Unrecognized or missing labels map to `Unknown`
    /// rather than failing; the source tag is informational.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "ANU" => Source::Anu,
            "SIMULATOR" | "SIM" => Source::Simulator,
            _ => Source::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Source::Anu => "ANU",
            Source::Simulator => "SIMULATOR",
            Source::Unknown => "UNKNOWN",
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Unknown
    }
}

/// Summary statistics over one batch of generated numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub mean: f64,
    pub std: f64,
    pub min: u32,
    pub max: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<u32>,
}

/// The canonical, schema-stable result every downstream consumer works from.
///
/// Replaced wholesale on each successful generation; a failed attempt never
/// mutates it. Every element of `numbers` fits in `num_bits` bits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub numbers: Vec<u32>,
    pub num_bits: u8,
    pub source: Source,
    pub statistics: Statistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
}

impl GenerationResult {
    /// Largest value representable in `num_bits` bits.
    pub fn max_value(&self) -> u32 {
        max_value(self.num_bits)
    }
}

/// Normalized view of the backend's `/health` payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// The service answered and reported a success-like status.
    pub live: bool,
    /// Upstream quantum-source availability, when the payload carries a flag.
    pub upstream: Option<bool>,
}

/// Largest value representable in `num_bits` bits (`num_bits` must be `<= 16`,
/// which every validated request guarantees).
pub fn max_value(num_bits: u8) -> u32 {
    (1u32 << num_bits) - 1
}
