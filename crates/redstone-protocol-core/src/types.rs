//! Strong type definitions for the RedStone protocol.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use std::fmt;

use crate::constants::{FEED_ID_BS, MAX_FEED_ID_TEXT_LEN};
use crate::crypto::Keccak256Hash;
use crate::error::{CoreError, Result};

/// A 32-byte encoded data feed identifier.
///
/// Short identifiers (up to 31 bytes of UTF-8) are right-padded with zeros;
/// longer ones are replaced by their Keccak-256 hash. Ordering is plain byte
/// order, which is the canonical data point order inside a package.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedId(pub [u8; FEED_ID_BS]);

impl FeedId {
    /// Encode a feed identifier string.
    pub fn encode(id: &str) -> Self {
        let bytes = id.as_bytes();
        if bytes.len() > MAX_FEED_ID_TEXT_LEN {
            return Self(Keccak256Hash::hash(bytes).0);
        }
        let mut arr = [0u8; FEED_ID_BS];
        arr[..bytes.len()].copy_from_slice(bytes);
        Self(arr)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; FEED_ID_BS]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; FEED_ID_BS] = bytes.try_into().map_err(|_| CoreError::MalformedField {
            field: "data feed id",
            expected: FEED_ID_BS,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; FEED_ID_BS] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The original text, when these bytes are a zero-padded printable id.
    ///
    /// Returns `None` for hashed identifiers and arbitrary bytes.
    pub fn label(&self) -> Option<String> {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(FEED_ID_BS);
        if len == 0 || len > MAX_FEED_ID_TEXT_LEN {
            return None;
        }
        if self.0[len..].iter().any(|&b| b != 0) {
            return None;
        }
        let text = std::str::from_utf8(&self.0[..len]).ok()?;
        if text.chars().any(char::is_control) {
            return None;
        }
        Some(text.to_string())
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "FeedId({label})"),
            None => write!(f, "FeedId(0x{}...)", &self.to_hex()[..8]),
        }
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(&label),
            None => write!(f, "0x{}", self.to_hex()),
        }
    }
}

impl AsRef<[u8]> for FeedId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; FEED_ID_BS]> for FeedId {
    fn from(bytes: [u8; FEED_ID_BS]) -> Self {
        Self(bytes)
    }
}

impl From<&str> for FeedId {
    fn from(id: &str) -> Self {
        Self::encode(id)
    }
}

/// A 20-byte signer address, derived from a recovered public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignerAddress(pub [u8; 20]);

impl SignerAddress {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256Hash::hash(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash.0[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Parse from hex, with or without `0x`. Case is not validated.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| CoreError::DecodingError(e.to_string()))?;
        let arr: [u8; 20] = bytes.as_slice().try_into().map_err(|_| CoreError::MalformedField {
            field: "signer address",
            expected: 20,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for SignerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignerAddress({})", self.to_checksum())
    }
}

impl fmt::Display for SignerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl AsRef<[u8]> for SignerAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for SignerAddress {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}
