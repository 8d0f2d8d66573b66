//! Wire constants shared by every encoder and decoder.
//!
//! These widths are not self-describing on the wire. A decoder walking a
//! payload backwards must know all of them a priori.
//!
//! **CRITICAL**: These values are FROZEN. Changing any of them breaks every
//! existing signature and every deployed verifier.

/// Width of an encoded data feed identifier.
pub const FEED_ID_BS: usize = 32;

/// Longest feed id text that is padded rather than hashed.
///
/// One byte shorter than [`FEED_ID_BS`] so a padded id always ends in zero.
pub const MAX_FEED_ID_TEXT_LEN: usize = 31;

/// Width of a recoverable ECDSA signature (`r ‖ s ‖ v`).
pub const SIGNATURE_BS: usize = 65;

/// Width of the package timestamp, in milliseconds.
pub const TIMESTAMP_BS: usize = 6;

/// Width of the shared value byte width field.
pub const DATA_POINT_VALUE_BYTE_SIZE_BS: usize = 4;

/// Width of the data points count field.
pub const DATA_POINTS_COUNT_BS: usize = 3;

/// Width of the data packages count field (single-sign payloads).
pub const DATA_PACKAGES_COUNT_BS: usize = 2;

/// Width of the signers count field (multi-sign packages).
pub const SIGNERS_COUNT_BS: usize = 1;

/// Width of the unsigned metadata byte size field.
pub const UNSIGNED_METADATA_BYTE_SIZE_BS: usize = 3;

/// Width of the payload version field embedded at the tail of the metadata.
pub const PAYLOAD_VERSION_BS: usize = 2;

/// Version tag written by multi-sign payloads.
pub const MULTI_SIGN_PAYLOAD_VERSION: u16 = 2;

/// Structural sentinel at the very end of every payload.
pub const REDSTONE_MARKER: [u8; 9] = [0x00, 0x00, 0x02, 0xed, 0x57, 0x01, 0x1e, 0x00, 0x00];

/// Default decimal exponent for numeric values.
pub const DEFAULT_NUM_VALUE_DECIMALS: u32 = 8;

/// Default byte width for numeric values (one EVM word).
pub const DEFAULT_NUM_VALUE_BS: usize = 32;

/// Largest timestamp representable in [`TIMESTAMP_BS`] bytes.
pub const MAX_TIMESTAMP_MS: u64 = (1 << (8 * TIMESTAMP_BS)) - 1;
