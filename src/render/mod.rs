//! Pure display transforms over a canonical result: number formatting,
//! frequency histograms, and locally computed summary statistics. Nothing in
//! here knows about the network or the presentation layer.

use thiserror::Error;

use crate::types::max_value;

pub mod histogram;
pub mod stats;

pub use histogram::{build_histogram, Histogram};
pub use stats::compute_statistics;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberBase {
    Decimal,
    Binary,
    Hexadecimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("value {value} does not fit in {num_bits} bits (max {max})")]
    OutOfRange { value: u32, num_bits: u8, max: u32 },
}

/// Render one value in the requested base.
///
/// Binary is zero-padded to `num_bits` digits; hexadecimal is uppercase and
/// zero-padded to `ceil(num_bits / 4)` digits, so columns line up across a
/// whole batch.
pub fn format_value(n: u32, base: NumberBase, num_bits: u8) -> Result<String, FormatError> {
    let max = max_value(num_bits);
    if n > max {
        return Err(FormatError::OutOfRange {
            value: n,
            num_bits,
            max,
        });
    }
    let formatted = match base {
        NumberBase::Decimal => n.to_string(),
        NumberBase::Binary => format!("{n:0width$b}", width = num_bits as usize),
        NumberBase::Hexadecimal => {
            format!("{n:0width$X}", width = (num_bits as usize).div_ceil(4))
        }
    };
    Ok(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_the_reference_values() {
        assert_eq!(format_value(255, NumberBase::Hexadecimal, 8).unwrap(), "FF");
        assert_eq!(format_value(1, NumberBase::Binary, 8).unwrap(), "00000001");
        assert_eq!(format_value(254, NumberBase::Decimal, 8).unwrap(), "254");
    }

    #[test]
    fn binary_width_matches_bit_count_and_round_trips() {
        for num_bits in 1..=16u8 {
            let max = max_value(num_bits);
            for n in [0, 1, max / 2, max] {
                let binary = format_value(n, NumberBase::Binary, num_bits).unwrap();
                assert_eq!(binary.len(), num_bits as usize);
                assert_eq!(u32::from_str_radix(&binary, 2).unwrap(), n);

                let hex = format_value(n, NumberBase::Hexadecimal, num_bits).unwrap();
                assert_eq!(hex.len(), (num_bits as usize).div_ceil(4));
                assert_eq!(u32::from_str_radix(&hex, 16).unwrap(), n);
            }
        }
    }

    #[test]
    fn hex_pads_to_nibble_width() {
        assert_eq!(format_value(1, NumberBase::Hexadecimal, 12).unwrap(), "001");
        assert_eq!(
            format_value(4_095, NumberBase::Hexadecimal, 12).unwrap(),
            "FFF"
        );
        assert_eq!(format_value(0, NumberBase::Hexadecimal, 1).unwrap(), "0");
    }

    #[test]
    fn rejects_values_wider_than_the_declared_bits() {
        assert_eq!(
            format_value(256, NumberBase::Binary, 8),
            Err(FormatError::OutOfRange {
                value: 256,
                num_bits: 8,
                max: 255
            })
        );
    }
}
