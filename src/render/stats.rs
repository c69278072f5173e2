use crate::types::Statistics;

/// Compute summary statistics locally, for payloads that arrive without any.
///
/// `std` is the population standard deviation, matching what the backend
/// reports when it does include statistics. Callers guarantee `numbers` is
/// non-empty (the normalizer rejects empty batches).
pub fn compute_statistics(numbers: &[u32]) -> Statistics {
    let n = numbers.len() as f64;
    let mean = numbers.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let variance = numbers
        .iter()
        .map(|&v| {
            let d = f64::from(v) - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let min = numbers.iter().copied().min().unwrap_or(0);
    let max = numbers.iter().copied().max().unwrap_or(0);
    Statistics {
        mean,
        std: variance.sqrt(),
        min,
        max,
        range: Some(max - min),
    }
}
