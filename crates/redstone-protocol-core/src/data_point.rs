//! Data point: a single (feed id, fixed-width value) pair.

use bytes::Bytes;
use rust_decimal::Decimal;

use crate::codec::{decode_value, encode_value};
use crate::config::NumericEncoding;
use crate::constants::FEED_ID_BS;
use crate::error::Result;
use crate::types::FeedId;

/// A data point: an encoded feed id and a big-endian value.
///
/// Serialized as `value ‖ feed_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPoint {
    /// Encoded feed identifier.
    pub feed_id: FeedId,
    /// Big-endian value bytes. Length is the value byte width.
    pub value: Bytes,
}

impl DataPoint {
    /// Create a data point from raw value bytes.
    pub fn new(feed_id: impl Into<FeedId>, value: impl Into<Bytes>) -> Self {
        Self {
            feed_id: feed_id.into(),
            value: value.into(),
        }
    }

    /// Create a numeric data point, scaling `value` by `10^decimals`.
    pub fn numeric(
        feed_id: impl Into<FeedId>,
        value: Decimal,
        encoding: &NumericEncoding,
    ) -> Result<Self> {
        let bytes = encode_value(value, encoding.decimals, encoding.value_byte_width)?;
        Ok(Self::new(feed_id, bytes))
    }

    /// Width of the value in bytes.
    pub fn value_byte_width(&self) -> usize {
        self.value.len()
    }

    /// Interpret the value as a decimal with the given exponent.
    pub fn to_decimal(&self, decimals: u32) -> Result<Decimal> {
        decode_value(&self.value, decimals, self.value.len())
    }

    /// Serialized length: value width plus the feed id.
    pub fn encoded_len(&self) -> usize {
        self.value.len() + FEED_ID_BS
    }

    /// Append `value ‖ feed_id` to `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value);
        buf.extend_from_slice(self.feed_id.as_bytes());
    }

    /// Serialize to `value ‖ feed_id`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf
    }
}
