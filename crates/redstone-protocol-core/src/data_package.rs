//! Data package: a timestamped, canonically ordered set of data points.
//!
//! Byte layout:
//!
//! ```text
//! [value ‖ feed_id] × n  ‖  timestamp(6)  ‖  value_byte_width(4)  ‖  n(3)
//! ```
//!
//! Points are sorted ascending by encoded feed id before serialization, so
//! the bytes (and the signable hash) do not depend on submission order.
//!
//! **CRITICAL**: This encoding is FROZEN. Changes break all existing signatures.

use bytes::Bytes;

use crate::codec::write_uint;
use crate::constants::{
    DATA_POINTS_COUNT_BS, DATA_POINT_VALUE_BYTE_SIZE_BS, FEED_ID_BS, TIMESTAMP_BS,
};
use crate::crypto::Keccak256Hash;
use crate::cursor::TailCursor;
use crate::data_point::DataPoint;
use crate::error::{CoreError, Result};
use crate::types::FeedId;

/// Bytes following the data points.
const PACKAGE_TRAILER_BS: usize = TIMESTAMP_BS + DATA_POINT_VALUE_BYTE_SIZE_BS + DATA_POINTS_COUNT_BS;

/// Validate points and return them in canonical order.
///
/// Pure: the input is left untouched.
fn normalize_points(points: &[DataPoint]) -> Result<Vec<DataPoint>> {
    let first = points.first().ok_or(CoreError::EmptyPackage)?;
    let width = first.value_byte_width();
    if width == 0 {
        return Err(CoreError::MalformedField {
            field: "value byte width",
            expected: 1,
            actual: 0,
        });
    }
    if let Some(odd) = points.iter().find(|p| p.value_byte_width() != width) {
        return Err(CoreError::InconsistentValueWidth {
            expected: width,
            actual: odd.value_byte_width(),
        });
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.feed_id.cmp(&b.feed_id));
    // Duplicates are adjacent after sort
    for window in sorted.windows(2) {
        if window[0].feed_id == window[1].feed_id {
            return Err(CoreError::DuplicateFeedId(window[0].feed_id));
        }
    }
    Ok(sorted)
}

/// Validate that decoded points are strictly ascending (decode path).
fn validate_points_sorted(points: &[DataPoint]) -> Result<()> {
    for window in points.windows(2) {
        match window[0].feed_id.cmp(&window[1].feed_id) {
            std::cmp::Ordering::Greater => return Err(CoreError::NonCanonicalOrder),
            std::cmp::Ordering::Equal => return Err(CoreError::DuplicateFeedId(window[0].feed_id)),
            std::cmp::Ordering::Less => {}
        }
    }
    Ok(())
}

/// A timestamped set of data points.
///
/// Construction keeps the caller's order; serialization always uses the
/// canonical order. Validation (non-empty, one shared value width, unique
/// feed ids) happens when the package is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPackage {
    /// Data points, in the order they were supplied.
    pub data_points: Vec<DataPoint>,
    /// Package timestamp in Unix milliseconds.
    pub timestamp_ms: u64,
}

impl DataPackage {
    /// Create a package. Nothing is validated until serialization.
    pub fn new(data_points: Vec<DataPoint>, timestamp_ms: u64) -> Self {
        Self {
            data_points,
            timestamp_ms,
        }
    }

    /// The data points in canonical order, validated.
    pub fn canonical_data_points(&self) -> Result<Vec<DataPoint>> {
        normalize_points(&self.data_points)
    }

    /// A new package with its points in canonical order.
    pub fn canonicalized(&self) -> Result<Self> {
        Ok(Self {
            data_points: self.canonical_data_points()?,
            timestamp_ms: self.timestamp_ms,
        })
    }

    /// The value width shared by every point.
    pub fn value_byte_width(&self) -> Option<usize> {
        self.data_points.first().map(DataPoint::value_byte_width)
    }

    /// Look up a point by feed id.
    pub fn get(&self, feed_id: &FeedId) -> Option<&DataPoint> {
        self.data_points.iter().find(|p| &p.feed_id == feed_id)
    }

    /// Serialized length in bytes.
    pub fn encoded_len(&self) -> usize {
        self.data_points.iter().map(DataPoint::encoded_len).sum::<usize>() + PACKAGE_TRAILER_BS
    }

    /// Serialize in canonical order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let points = self.canonical_data_points()?;
        let width = points[0].value_byte_width();

        let mut buf = Vec::with_capacity(self.encoded_len());
        for point in &points {
            point.write_to(&mut buf);
        }
        write_uint(&mut buf, self.timestamp_ms, TIMESTAMP_BS, "timestamp")?;
        write_uint(&mut buf, width as u64, DATA_POINT_VALUE_BYTE_SIZE_BS, "value byte width")?;
        write_uint(&mut buf, points.len() as u64, DATA_POINTS_COUNT_BS, "data points count")?;
        Ok(buf)
    }

    /// The hash that signers sign: `keccak256(to_bytes())`.
    pub fn signable_hash(&self) -> Result<Keccak256Hash> {
        Ok(Keccak256Hash::hash(&self.to_bytes()?))
    }

    /// Decode a package ending at the cursor position.
    ///
    /// Strict: points must already be in canonical order.
    pub fn read_from_tail(cursor: &mut TailCursor<'_>) -> Result<Self> {
        let count = cursor.take_count(DATA_POINTS_COUNT_BS, "data points count")?;
        let width = cursor.take_count(DATA_POINT_VALUE_BYTE_SIZE_BS, "value byte width")?;
        let timestamp_ms = cursor.take_uint(TIMESTAMP_BS, "timestamp")?;

        if count == 0 {
            return Err(CoreError::EmptyPackage);
        }
        if width == 0 {
            return Err(CoreError::MalformedField {
                field: "value byte width",
                expected: 1,
                actual: 0,
            });
        }
        cursor.ensure(count, width + FEED_ID_BS, "data points")?;

        let mut data_points = Vec::with_capacity(count);
        for _ in 0..count {
            let feed_id = FeedId::from_slice(cursor.take(FEED_ID_BS, "data feed id")?)?;
            let value = Bytes::copy_from_slice(cursor.take(width, "value")?);
            data_points.push(DataPoint { feed_id, value });
        }
        data_points.reverse();
        validate_points_sorted(&data_points)?;

        Ok(Self {
            data_points,
            timestamp_ms,
        })
    }

    /// Decode a package that occupies the whole buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = TailCursor::new(bytes);
        let package = Self::read_from_tail(&mut cursor)?;
        if cursor.remaining() != 0 {
            return Err(CoreError::MalformedField {
                field: "data package",
                expected: cursor.consumed(),
                actual: bytes.len(),
            });
        }
        Ok(package)
    }
}
