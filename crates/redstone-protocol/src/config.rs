//! Parser configuration.

use serde::{Deserialize, Serialize};

use redstone_protocol_core::constants::{DATA_PACKAGES_COUNT_BS, DATA_POINTS_COUNT_BS};

/// Limits applied while parsing untrusted payloads.
///
/// The defaults are the largest counts the wire fields can express, so a
/// default parser rejects nothing the format allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    /// Maximum data packages in a single-sign payload.
    pub max_data_packages: usize,
    /// Maximum data points in any one package.
    pub max_data_points: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_data_packages: (1 << (8 * DATA_PACKAGES_COUNT_BS)) - 1,
            max_data_points: (1 << (8 * DATA_POINTS_COUNT_BS)) - 1,
        }
    }
}
