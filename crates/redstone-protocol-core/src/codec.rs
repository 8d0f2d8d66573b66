//! Primitive codec: fixed-width feed ids, scaled numeric values and
//! big-endian counters.
//!
//! Encoding never truncates. A value that does not fit its field is an error.

use num_bigint::BigUint;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{CoreError, Result};
use crate::types::FeedId;

/// Encode a feed identifier into its fixed 32-byte form.
pub fn encode_feed_id(id: &str) -> FeedId {
    FeedId::encode(id)
}

/// Decode a 32-byte feed identifier.
pub fn decode_feed_id(bytes: &[u8]) -> Result<FeedId> {
    FeedId::from_slice(bytes)
}

/// Encode `round(value × 10^decimals)` as a big-endian integer of `width` bytes.
pub fn encode_value(value: Decimal, decimals: u32, width: usize) -> Result<Vec<u8>> {
    if width == 0 {
        return Err(CoreError::MalformedField {
            field: "value byte width",
            expected: 1,
            actual: 0,
        });
    }

    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        return Err(CoreError::NegativeValue);
    }

    // round_dp leaves scale <= decimals
    let mantissa = BigUint::from(rounded.mantissa().unsigned_abs());
    let scaled = mantissa * BigUint::from(10u32).pow(decimals - rounded.scale());

    let digits = scaled.to_bytes_be();
    let digits = strip_leading_zeros(&digits);
    if digits.len() > width {
        return Err(CoreError::ValueOverflow { width });
    }

    let mut out = vec![0u8; width];
    out[width - digits.len()..].copy_from_slice(digits);
    Ok(out)
}

/// Decode a big-endian scaled integer back to a decimal.
pub fn decode_value(bytes: &[u8], decimals: u32, width: usize) -> Result<Decimal> {
    if bytes.len() != width {
        return Err(CoreError::MalformedField {
            field: "value",
            expected: width,
            actual: bytes.len(),
        });
    }

    let digits = strip_leading_zeros(bytes);
    if digits.len() > 16 {
        return Err(CoreError::ValueOverflow { width });
    }
    let mut buf = [0u8; 16];
    buf[16 - digits.len()..].copy_from_slice(digits);
    let raw = u128::from_be_bytes(buf);

    let mantissa = i128::try_from(raw).map_err(|_| CoreError::ValueOverflow { width })?;
    Decimal::try_from_i128_with_scale(mantissa, decimals)
        .map(|d| d.normalize())
        .map_err(|_| CoreError::ValueOverflow { width })
}

/// Append `value` as a big-endian integer of exactly `width` bytes (max 8).
pub fn write_uint(buf: &mut Vec<u8>, value: u64, width: usize, field: &'static str) -> Result<()> {
    debug_assert!(width > 0 && width <= 8);
    if width < 8 && value >> (8 * width) != 0 {
        return Err(CoreError::FieldOverflow {
            field,
            value: u128::from(value),
            width,
        });
    }
    buf.extend_from_slice(&value.to_be_bytes()[8 - width..]);
    Ok(())
}

/// Read a big-endian unsigned integer of at most 8 bytes.
pub fn read_uint(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
