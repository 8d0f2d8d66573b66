//! Backward payload parser.
//!
//! The parser never assumes where a payload starts. It walks from the end of
//! the buffer towards its start:
//!
//! 1. marker
//! 2. unsigned metadata size
//! 3. version probe on the last two metadata bytes
//! 4. unsigned metadata
//! 5. data packages count (single-sign only)
//! 6. packages, last one first
//!
//! Whatever precedes the payload is handed back untouched as the remainder
//! prefix. Any failure rejects the whole buffer.

use redstone_protocol_core::constants::{
    DATA_PACKAGES_COUNT_BS, DATA_POINTS_COUNT_BS, DATA_POINT_VALUE_BYTE_SIZE_BS, FEED_ID_BS,
    MULTI_SIGN_PAYLOAD_VERSION, PAYLOAD_VERSION_BS, REDSTONE_MARKER, SIGNATURE_BS,
    SIGNERS_COUNT_BS, TIMESTAMP_BS, UNSIGNED_METADATA_BYTE_SIZE_BS,
};
use redstone_protocol_core::{MultiSignDataPackage, SignedDataPackage, TailCursor};

use crate::config::ParserConfig;
use crate::error::{Error, Result};
use crate::payload::{PayloadPackages, PayloadVersion, RedstonePayload};

/// Smallest possible signed package: one point with a one-byte value.
const MIN_SIGNED_PACKAGE_BS: usize = FEED_ID_BS
    + 1
    + TIMESTAMP_BS
    + DATA_POINT_VALUE_BYTE_SIZE_BS
    + DATA_POINTS_COUNT_BS
    + SIGNATURE_BS;

/// A payload recovered from the tail of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPayload<'a> {
    /// The decoded payload.
    pub payload: RedstonePayload,
    /// Every byte before the payload, uninterpreted.
    pub remainder_prefix: &'a [u8],
}

/// Parse the payload at the end of `buffer` with default limits.
pub fn parse(buffer: &[u8]) -> Result<ParsedPayload<'_>> {
    parse_with(buffer, &ParserConfig::default())
}

/// Parse the payload at the end of `buffer`.
pub fn parse_with<'a>(buffer: &'a [u8], config: &ParserConfig) -> Result<ParsedPayload<'a>> {
    let mut cursor = TailCursor::new(buffer);

    expect_marker(&mut cursor)?;

    let metadata_size =
        cursor.take_count(UNSIGNED_METADATA_BYTE_SIZE_BS, "unsigned metadata size")?;
    cursor.ensure(metadata_size, 1, "unsigned metadata")?;

    let version = probe_version(&cursor, metadata_size);
    let metadata_len = match version {
        PayloadVersion::SingleSign => metadata_size,
        PayloadVersion::MultiSign => {
            cursor.take(PAYLOAD_VERSION_BS, "payload version")?;
            metadata_size - PAYLOAD_VERSION_BS
        }
    };
    let unsigned_metadata = std::str::from_utf8(cursor.take(metadata_len, "unsigned metadata")?)
        .map_err(|_| Error::MalformedMetadata)?
        .to_string();

    let packages = match version {
        PayloadVersion::SingleSign => {
            PayloadPackages::SingleSign(read_single_sign_packages(&mut cursor, config)?)
        }
        PayloadVersion::MultiSign => {
            let signers = cursor
                .peek(SIGNERS_COUNT_BS)
                .map_or(0, |count| usize::from(count[0]));
            if signers > 0 {
                check_points_limit(&cursor, SIGNERS_COUNT_BS + signers * SIGNATURE_BS, config)?;
            }
            let package = MultiSignDataPackage::read_from_tail(&mut cursor)?;
            tracing::trace!(
                signers = package.signatures.len(),
                points = package.data_package.data_points.len(),
                "decoded multi-sign package"
            );
            PayloadPackages::MultiSign(package)
        }
    };

    let remainder_prefix = cursor.into_prefix();
    tracing::debug!(
        version = %version,
        metadata_len,
        prefix_len = remainder_prefix.len(),
        "parsed payload"
    );

    Ok(ParsedPayload {
        payload: RedstonePayload {
            packages,
            unsigned_metadata,
        },
        remainder_prefix,
    })
}

fn expect_marker(cursor: &mut TailCursor<'_>) -> Result<()> {
    match cursor.peek(REDSTONE_MARKER.len()) {
        Some(tail) if tail == REDSTONE_MARKER => {
            cursor.take(REDSTONE_MARKER.len(), "marker")?;
            Ok(())
        }
        Some(tail) => Err(Error::InvalidMarker {
            found: hex::encode(tail),
        }),
        None => Err(Error::InvalidMarker {
            found: hex::encode(cursor.peek(cursor.remaining()).unwrap_or_default()),
        }),
    }
}

/// Decide the generation from the metadata region, without consuming it.
///
/// A region shorter than the version field cannot hold a tag, so it is
/// single-sign. Otherwise only an exact tag match means multi-sign.
fn probe_version(cursor: &TailCursor<'_>, metadata_size: usize) -> PayloadVersion {
    if metadata_size < PAYLOAD_VERSION_BS {
        return PayloadVersion::SingleSign;
    }
    match cursor.peek(PAYLOAD_VERSION_BS) {
        Some(tag) if tag == MULTI_SIGN_PAYLOAD_VERSION.to_be_bytes() => PayloadVersion::MultiSign,
        _ => PayloadVersion::SingleSign,
    }
}

fn read_single_sign_packages(
    cursor: &mut TailCursor<'_>,
    config: &ParserConfig,
) -> Result<Vec<SignedDataPackage>> {
    let count = cursor.take_count(DATA_PACKAGES_COUNT_BS, "data packages count")?;
    if count == 0 {
        return Err(Error::NoDataPackages);
    }
    if count > config.max_data_packages {
        return Err(Error::LimitExceeded {
            field: "data packages",
            count,
            limit: config.max_data_packages,
        });
    }
    cursor.ensure(count, MIN_SIGNED_PACKAGE_BS, "data packages")?;

    let mut packages = Vec::with_capacity(count);
    for index in (0..count).rev() {
        check_points_limit(cursor, SIGNATURE_BS, config)?;
        let package = SignedDataPackage::read_from_tail(cursor)?;
        tracing::trace!(
            index,
            points = package.data_package.data_points.len(),
            timestamp_ms = package.data_package.timestamp_ms,
            "decoded data package"
        );
        packages.push(package);
    }
    packages.reverse();
    Ok(packages)
}

/// Read the points count of the next package, past `signatures_len` bytes
/// of signatures, without consuming anything.
///
/// Runs before the package is decoded, so an oversized count is refused
/// before any point is read. A count that cannot be read is left for the
/// decoder to report.
fn check_points_limit(
    cursor: &TailCursor<'_>,
    signatures_len: usize,
    config: &ParserConfig,
) -> Result<()> {
    let mut ahead = *cursor;
    if ahead.take(signatures_len, "signatures").is_err() {
        return Ok(());
    }
    let Ok(count) = ahead.take_count(DATA_POINTS_COUNT_BS, "data points count") else {
        return Ok(());
    };
    if count > config.max_data_points {
        return Err(Error::LimitExceeded {
            field: "data points",
            count,
            limit: config.max_data_points,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use redstone_protocol_core::{CoreError, DataPackage, DataPoint, Keypair, NumericEncoding};
    use rust_decimal::Decimal;

    fn package(ts: u64, feeds: &[&str]) -> DataPackage {
        let enc = NumericEncoding::default();
        let points = feeds
            .iter()
            .enumerate()
            .map(|(i, f)| DataPoint::numeric(*f, Decimal::from(i as u64 + 1), &enc).unwrap())
            .collect();
        DataPackage::new(points, ts)
    }

    fn keypair(seed: u8) -> Keypair {
        Keypair::from_bytes(&[seed; 32]).unwrap()
    }

    fn single_payload(n: usize, metadata: &str) -> RedstonePayload {
        let packages = (0..n)
            .map(|i| {
                SignedDataPackage::sign(&package(1000 + i as u64, &["BTC", "ETH"]), &keypair(1))
                    .unwrap()
            })
            .collect::<Vec<_>>();
        RedstonePayload::new(packages, metadata)
    }

    fn multi_payload(metadata: &str) -> RedstonePayload {
        let multi = MultiSignDataPackage::sign(
            &package(1000, &["BTC", "ETH", "AVAX"]),
            &[keypair(1), keypair(2), keypair(3)],
        )
        .unwrap();
        RedstonePayload::new(multi, metadata)
    }

    #[test]
    fn test_single_sign_roundtrip() {
        let payload = single_payload(3, "1.0.0#test");
        let bytes = payload.to_bytes().unwrap();
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.payload, payload);
        assert!(parsed.remainder_prefix.is_empty());
    }

    #[test]
    fn test_multi_sign_roundtrip() {
        let payload = multi_payload("cosign");
        let bytes = payload.to_bytes().unwrap();
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.payload.version(), PayloadVersion::MultiSign);
        assert_eq!(parsed.payload, payload);
    }

    #[test]
    fn test_multi_sign_empty_metadata() {
        let payload = multi_payload("");
        let bytes = payload.to_bytes().unwrap();
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.payload.unsigned_metadata, "");
        assert_eq!(parsed.payload.version(), PayloadVersion::MultiSign);
    }

    #[test]
    fn test_short_metadata_is_single_sign() {
        for metadata in ["", "x"] {
            let payload = single_payload(1, metadata);
            let bytes = payload.to_bytes().unwrap();
            let parsed = parse(&bytes).unwrap();
            assert_eq!(parsed.payload.version(), PayloadVersion::SingleSign);
            assert_eq!(parsed.payload.unsigned_metadata, metadata);
        }
    }

    #[test]
    fn test_prefix_returned_untouched() {
        let payload = single_payload(2, "tag");
        let prefix = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01];
        let mut buffer = prefix.to_vec();
        buffer.extend(payload.to_bytes().unwrap());

        let parsed = parse(&buffer).unwrap();
        assert_eq!(parsed.remainder_prefix, &prefix);
        assert_eq!(parsed.payload, payload);
    }

    #[test]
    fn test_invalid_marker() {
        let mut bytes = single_payload(1, "").to_bytes().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(matches!(parse(&bytes), Err(Error::InvalidMarker { .. })));
        assert!(matches!(parse(&[]), Err(Error::InvalidMarker { .. })));
        assert!(matches!(parse(&[0x02, 0xed]), Err(Error::InvalidMarker { .. })));
    }

    #[test]
    fn test_metadata_size_past_start() {
        let mut bytes = vec![0xff, 0xff, 0xff];
        bytes.extend_from_slice(&REDSTONE_MARKER);
        assert!(matches!(
            parse(&bytes),
            Err(Error::Core(CoreError::TruncatedBuffer {
                field: "unsigned metadata",
                ..
            }))
        ));
    }

    #[test]
    fn test_package_count_past_start() {
        let mut bytes = vec![0x00, 0x05, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&REDSTONE_MARKER);
        assert!(matches!(
            parse(&bytes),
            Err(Error::Core(CoreError::TruncatedBuffer {
                field: "data packages",
                ..
            }))
        ));
    }

    #[test]
    fn test_zero_packages_rejected() {
        let mut bytes = vec![0x00, 0x00, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&REDSTONE_MARKER);
        assert_eq!(parse(&bytes), Err(Error::NoDataPackages));
    }

    #[test]
    fn test_non_utf8_metadata() {
        let mut bytes = vec![0x00, 0x01, 0xff, 0xfe, 0x00, 0x00, 0x02];
        bytes.extend_from_slice(&REDSTONE_MARKER);
        assert_eq!(parse(&bytes), Err(Error::MalformedMetadata));
    }

    #[test]
    fn test_truncated_payload_fails_whole() {
        let bytes = single_payload(2, "m").to_bytes().unwrap();
        // Drop the first byte of the first package
        assert!(matches!(
            parse(&bytes[1..]),
            Err(Error::Core(CoreError::TruncatedBuffer { .. }))
        ));
    }

    #[test]
    fn test_package_limit() {
        let bytes = single_payload(3, "").to_bytes().unwrap();
        let config = ParserConfig {
            max_data_packages: 2,
            ..ParserConfig::default()
        };
        assert_eq!(
            parse_with(&bytes, &config),
            Err(Error::LimitExceeded {
                field: "data packages",
                count: 3,
                limit: 2
            })
        );
    }

    #[test]
    fn test_point_limit() {
        let bytes = multi_payload("").to_bytes().unwrap();
        let config = ParserConfig {
            max_data_points: 2,
            ..ParserConfig::default()
        };
        assert_eq!(
            parse_with(&bytes, &config),
            Err(Error::LimitExceeded {
                field: "data points",
                count: 3,
                limit: 2
            })
        );
    }

    #[test]
    fn test_point_limit_checked_before_decoding() {
        // One package claiming 256 points, with only one point of bytes present
        let mut bytes = vec![0u8; FEED_ID_BS + 32];
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 1]);
        bytes.extend_from_slice(&[0, 0, 0, 0x20]);
        bytes.extend_from_slice(&[0, 1, 0]);
        bytes.extend_from_slice(&[0u8; SIGNATURE_BS]);
        bytes.extend_from_slice(&[0, 1]);
        bytes.extend_from_slice(&[0, 0, 0]);
        bytes.extend_from_slice(&REDSTONE_MARKER);

        assert!(matches!(
            parse(&bytes),
            Err(Error::Core(CoreError::TruncatedBuffer { .. }))
        ));

        let config = ParserConfig {
            max_data_points: 10,
            ..ParserConfig::default()
        };
        assert_eq!(
            parse_with(&bytes, &config),
            Err(Error::LimitExceeded {
                field: "data points",
                count: 256,
                limit: 10
            })
        );
    }

    #[test]
    fn test_foreign_metadata_ending_in_version_tag() {
        // A single-sign payload from another writer whose metadata happens to
        // end in 0x0002. It reads as multi-sign and then fails to decode.
        let signed = SignedDataPackage::sign(&package(1000, &["BTC"]), &keypair(1)).unwrap();
        let mut bytes = signed.to_bytes().unwrap();
        bytes.extend_from_slice(&[0, 1]);
        bytes.extend_from_slice(b"x\0\x02");
        bytes.extend_from_slice(&[0, 0, 3]);
        bytes.extend_from_slice(&REDSTONE_MARKER);

        let mut cursor = TailCursor::new(&bytes);
        expect_marker(&mut cursor).unwrap();
        let size = cursor
            .take_count(UNSIGNED_METADATA_BYTE_SIZE_BS, "unsigned metadata size")
            .unwrap();
        assert_eq!(probe_version(&cursor, size), PayloadVersion::MultiSign);

        assert!(matches!(
            parse(&bytes),
            Err(Error::Core(CoreError::TruncatedBuffer {
                field: "data points",
                ..
            }))
        ));
    }
}
