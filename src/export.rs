//! Client-side serializations of the last canonical result. Distinct from the
//! backend's own `/export/*` endpoints, which return the server's files.

use thiserror::Error;

use crate::render::{format_value, NumberBase};
use crate::types::GenerationResult;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no generation result to export yet")]
    NoResult,
    #[error("could not serialize result: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pretty-printed JSON of the full canonical result.
pub fn to_json(result: &GenerationResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// CSV with one row per number, binary column padded to the result's width.
pub fn to_csv(result: &GenerationResult) -> String {
    let mut out = String::from("index,decimal,binary\n");
    for (index, &n) in result.numbers.iter().enumerate() {
        let Ok(binary) = format_value(n, NumberBase::Binary, result.num_bits) else {
            continue;
        };
        out.push_str(&format!("{index},{n},{binary}\n"));
    }
    out
}

/// One formatted number per line, for pasting. Rows that do not fit the
/// declared width are skipped, matching the renderer's skip-and-continue
/// policy.
pub fn to_clipboard_text(result: &GenerationResult, base: NumberBase) -> String {
    result
        .numbers
        .iter()
        .filter_map(|&n| format_value(n, base, result.num_bits).ok())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Source, Statistics};
    use pretty_assertions::assert_eq;

    fn sample() -> GenerationResult {
        GenerationResult {
            numbers: vec![0, 255, 5],
            num_bits: 8,
            source: Source::Anu,
            statistics: Statistics {
                mean: 86.67,
                std: 118.57,
                min: 0,
                max: 255,
                range: Some(255),
            },
            timestamp: Some("2025-03-02T10:00:00Z".into()),
            version: None,
            entropy: None,
        }
    }

    #[test]
    fn csv_has_header_and_padded_binary() {
        let csv = to_csv(&sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "index,decimal,binary");
        assert_eq!(lines[1], "0,0,00000000");
        assert_eq!(lines[2], "1,255,11111111");
        assert_eq!(lines[3], "2,5,00000101");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn json_round_trips_the_result() {
        let result = sample();
        let json = to_json(&result).unwrap();
        let parsed: GenerationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn clipboard_text_uses_the_requested_base() {
        let result = sample();
        assert_eq!(
            to_clipboard_text(&result, NumberBase::Hexadecimal),
            "00\nFF\n05"
        );
        assert_eq!(to_clipboard_text(&result, NumberBase::Decimal), "0\n255\n5");
    }
}
