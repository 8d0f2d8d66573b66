//! Numeric encoding configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_NUM_VALUE_BS, DEFAULT_NUM_VALUE_DECIMALS};

/// How a decimal value is turned into a fixed-width integer.
///
/// Every data point in one package must share `value_byte_width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NumericEncoding {
    /// Decimal exponent: values are stored as `round(value × 10^decimals)`.
    pub decimals: u32,
    /// Width of the big-endian value in bytes.
    pub value_byte_width: usize,
}

impl NumericEncoding {
    /// Encoding with a custom exponent and width.
    pub const fn new(decimals: u32, value_byte_width: usize) -> Self {
        Self {
            decimals,
            value_byte_width,
        }
    }
}

impl Default for NumericEncoding {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_NUM_VALUE_DECIMALS,
            value_byte_width: DEFAULT_NUM_VALUE_BS,
        }
    }
}
