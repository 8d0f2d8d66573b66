//! Error types for payload building and parsing.

use redstone_protocol_core::CoreError;
use thiserror::Error;

/// Errors raised while building, parsing or converting a payload.
///
/// All of them are structural. Whether the recovered signers are trusted
/// is a separate question, answered by [`crate::trust`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Error from the package layer.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// The buffer does not end with the payload marker.
    #[error("invalid payload marker: got 0x{found}")]
    InvalidMarker { found: String },

    /// A version number this implementation does not understand.
    #[error("unsupported payload version: {0}")]
    UnsupportedVersion(u64),

    /// A single-sign payload must carry at least one package.
    #[error("payload has no data packages")]
    NoDataPackages,

    /// Single-sign metadata would be read back as a multi-sign version tag.
    #[error("unsigned metadata ends with the multi-sign version tag")]
    AmbiguousMetadata,

    /// The unsigned metadata region is not valid UTF-8.
    #[error("unsigned metadata is not valid UTF-8")]
    MalformedMetadata,

    /// A declared count exceeds the configured parser limit.
    #[error("{field} count {count} exceeds limit {limit}")]
    LimitExceeded {
        field: &'static str,
        count: usize,
        limit: usize,
    },

    /// The object form could not be read or written.
    #[error("object format error: {0}")]
    Object(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Object(e.to_string())
    }
}

/// Result type for payload operations.
pub type Result<T> = std::result::Result<T, Error>;
