//! Error types for the RedStone protocol core.

use thiserror::Error;

use crate::types::FeedId;

/// Errors raised while encoding, decoding or signing data packages.
///
/// Every variant is fatal for the call that produced it. There is no
/// partial result: either the full structure is produced or an error is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("malformed {field}: expected {expected} bytes, got {actual}")]
    MalformedField {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate data feed id: {0}")]
    DuplicateFeedId(FeedId),

    #[error("data package contains no data points")]
    EmptyPackage,

    #[error("inconsistent value byte width: expected {expected}, got {actual}")]
    InconsistentValueWidth { expected: usize, actual: usize },

    #[error("truncated buffer: {field} needs {needed} bytes, {remaining} remaining")]
    TruncatedBuffer {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("multi-sign data package has no signatures")]
    EmptySignatureSet,

    #[error("value does not fit in {width} bytes")]
    ValueOverflow { width: usize },

    #[error("negative values cannot be encoded")]
    NegativeValue,

    #[error("{field} value {value} does not fit in {width} bytes")]
    FieldOverflow {
        field: &'static str,
        value: u128,
        width: usize,
    },

    #[error("data points are not in canonical feed id order")]
    NonCanonicalOrder,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
