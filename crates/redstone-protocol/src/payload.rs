//! Payload envelope: signed packages, unsigned metadata and the trailer.
//!
//! Byte layouts, left to right:
//!
//! ```text
//! single-sign: signed_package × n ‖ n(2) ‖ metadata ‖ len(metadata)(3) ‖ marker(9)
//! multi-sign:  multi_sign_package ‖ metadata ‖ version(2) ‖ len(metadata)+2 (3) ‖ marker(9)
//! ```
//!
//! The version tag of a multi-sign payload sits inside what a single-sign
//! reader sees as opaque metadata. The two generations are told apart by
//! probing the last two metadata bytes, see [`crate::parser`].
//!
//! **CRITICAL**: This encoding is FROZEN. Deployed verifiers depend on it.

use std::fmt;

use redstone_protocol_core::codec::write_uint;
use redstone_protocol_core::constants::{
    DATA_PACKAGES_COUNT_BS, MULTI_SIGN_PAYLOAD_VERSION, PAYLOAD_VERSION_BS, REDSTONE_MARKER,
    UNSIGNED_METADATA_BYTE_SIZE_BS,
};
use redstone_protocol_core::{
    CoreError, DataPackage, MultiSignDataPackage, SignedDataPackage, SignerAddress,
};

use crate::error::{Error, Result};
use crate::parser;

/// Payload generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadVersion {
    /// One signature per package, no version tag on the wire.
    SingleSign,
    /// One package with several signatures, tagged with version 2.
    MultiSign,
}

impl PayloadVersion {
    /// Version number used by the object form.
    pub const fn number(self) -> u16 {
        match self {
            PayloadVersion::SingleSign => 1,
            PayloadVersion::MultiSign => MULTI_SIGN_PAYLOAD_VERSION,
        }
    }

    /// Map a version number back to a generation.
    pub fn from_number(number: u64) -> Result<Self> {
        match number {
            1 => Ok(PayloadVersion::SingleSign),
            n if n == u64::from(MULTI_SIGN_PAYLOAD_VERSION) => Ok(PayloadVersion::MultiSign),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }
}

impl fmt::Display for PayloadVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadVersion::SingleSign => write!(f, "single-sign (v{})", self.number()),
            PayloadVersion::MultiSign => write!(f, "multi-sign (v{})", self.number()),
        }
    }
}

/// The signed content of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadPackages {
    /// Independent packages, each with one signer.
    SingleSign(Vec<SignedDataPackage>),
    /// One package cosigned by several signers.
    MultiSign(MultiSignDataPackage),
}

impl PayloadPackages {
    /// The generation these packages are serialized as.
    pub fn version(&self) -> PayloadVersion {
        match self {
            PayloadPackages::SingleSign(_) => PayloadVersion::SingleSign,
            PayloadPackages::MultiSign(_) => PayloadVersion::MultiSign,
        }
    }

    /// The underlying data packages, in wire order.
    pub fn data_packages(&self) -> Vec<&DataPackage> {
        match self {
            PayloadPackages::SingleSign(packages) => {
                packages.iter().map(|p| &p.data_package).collect()
            }
            PayloadPackages::MultiSign(package) => vec![&package.data_package],
        }
    }
}

impl From<Vec<SignedDataPackage>> for PayloadPackages {
    fn from(packages: Vec<SignedDataPackage>) -> Self {
        PayloadPackages::SingleSign(packages)
    }
}

impl From<MultiSignDataPackage> for PayloadPackages {
    fn from(package: MultiSignDataPackage) -> Self {
        PayloadPackages::MultiSign(package)
    }
}

/// A complete payload: signed packages plus free-form unsigned metadata.
///
/// The metadata is not covered by any signature. Anyone relaying the
/// payload can change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedstonePayload {
    /// Signed packages.
    pub packages: PayloadPackages,
    /// Unsigned, attacker-controlled text.
    pub unsigned_metadata: String,
}

impl RedstonePayload {
    /// Create a payload.
    pub fn new(packages: impl Into<PayloadPackages>, unsigned_metadata: impl Into<String>) -> Self {
        Self {
            packages: packages.into(),
            unsigned_metadata: unsigned_metadata.into(),
        }
    }

    /// The payload generation.
    pub fn version(&self) -> PayloadVersion {
        self.packages.version()
    }

    /// Serialize the envelope.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let metadata = self.unsigned_metadata.as_bytes();
        let mut buf = Vec::new();

        match &self.packages {
            PayloadPackages::SingleSign(packages) => {
                if packages.is_empty() {
                    return Err(Error::NoDataPackages);
                }
                if ends_with_version_tag(metadata) {
                    return Err(Error::AmbiguousMetadata);
                }
                for package in packages {
                    package.write_to(&mut buf)?;
                }
                write_uint(
                    &mut buf,
                    packages.len() as u64,
                    DATA_PACKAGES_COUNT_BS,
                    "data packages count",
                )?;
                buf.extend_from_slice(metadata);
                write_uint(
                    &mut buf,
                    metadata.len() as u64,
                    UNSIGNED_METADATA_BYTE_SIZE_BS,
                    "unsigned metadata size",
                )?;
            }
            PayloadPackages::MultiSign(package) => {
                package.write_to(&mut buf)?;
                buf.extend_from_slice(metadata);
                buf.extend_from_slice(&MULTI_SIGN_PAYLOAD_VERSION.to_be_bytes());
                write_uint(
                    &mut buf,
                    (metadata.len() + PAYLOAD_VERSION_BS) as u64,
                    UNSIGNED_METADATA_BYTE_SIZE_BS,
                    "unsigned metadata size",
                )?;
            }
        }
        buf.extend_from_slice(&REDSTONE_MARKER);

        tracing::debug!(
            version = %self.version(),
            packages = self.packages.data_packages().len(),
            bytes = buf.len(),
            "prepared payload"
        );
        Ok(buf)
    }

    /// Serialize the envelope as lowercase hex, without `0x`.
    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// Parse a buffer that contains exactly one payload and nothing else.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let parsed = parser::parse(bytes)?;
        if !parsed.remainder_prefix.is_empty() {
            return Err(CoreError::MalformedField {
                field: "payload",
                expected: bytes.len() - parsed.remainder_prefix.len(),
                actual: bytes.len(),
            }
            .into());
        }
        Ok(parsed.payload)
    }

    /// Recover the signers of every package, in wire order.
    ///
    /// Single-sign payloads yield one address per package; a multi-sign
    /// payload yields one list in signature order.
    pub fn recover_signers(&self) -> Result<Vec<Vec<SignerAddress>>> {
        match &self.packages {
            PayloadPackages::SingleSign(packages) => packages
                .iter()
                .map(|p| Ok(vec![p.recover_signer_address()?]))
                .collect(),
            PayloadPackages::MultiSign(package) => Ok(vec![package.recover_signer_addresses()?]),
        }
    }
}

/// Serialize packages and metadata into a payload.
pub fn prepare(packages: impl Into<PayloadPackages>, unsigned_metadata: &str) -> Result<Vec<u8>> {
    RedstonePayload::new(packages, unsigned_metadata).to_bytes()
}

/// True if these metadata bytes would be probed as a multi-sign version tag.
pub(crate) fn ends_with_version_tag(metadata: &[u8]) -> bool {
    metadata.len() >= PAYLOAD_VERSION_BS
        && metadata[metadata.len() - PAYLOAD_VERSION_BS..] == MULTI_SIGN_PAYLOAD_VERSION.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use redstone_protocol_core::{DataPoint, Keypair, NumericEncoding};
    use rust_decimal::Decimal;

    fn package(ts: u64) -> DataPackage {
        let enc = NumericEncoding::default();
        DataPackage::new(
            vec![
                DataPoint::numeric("BTC", Decimal::from(42000), &enc).unwrap(),
                DataPoint::numeric("ETH", Decimal::from(2000), &enc).unwrap(),
            ],
            ts,
        )
    }

    fn keypair(seed: u8) -> Keypair {
        Keypair::from_bytes(&[seed; 32]).unwrap()
    }

    fn single(metadata: &str) -> RedstonePayload {
        let signed = SignedDataPackage::sign(&package(1), &keypair(1)).unwrap();
        RedstonePayload::new(vec![signed], metadata)
    }

    #[test]
    fn test_version_numbers() {
        assert_eq!(PayloadVersion::SingleSign.number(), 1);
        assert_eq!(PayloadVersion::MultiSign.number(), 2);
        assert_eq!(PayloadVersion::from_number(2).unwrap(), PayloadVersion::MultiSign);
        assert_eq!(PayloadVersion::from_number(7), Err(Error::UnsupportedVersion(7)));
    }

    #[test]
    fn test_single_sign_trailer() {
        let bytes = single("abc").to_bytes().unwrap();
        let n = bytes.len();
        assert_eq!(&bytes[n - 9..], &REDSTONE_MARKER);
        assert_eq!(&bytes[n - 12..n - 9], &[0, 0, 3]);
        assert_eq!(&bytes[n - 15..n - 12], b"abc");
        assert_eq!(&bytes[n - 17..n - 15], &[0, 1]);
    }

    #[test]
    fn test_multi_sign_trailer() {
        let multi =
            MultiSignDataPackage::sign(&package(1), &[keypair(1), keypair(2)]).unwrap();
        let payload = RedstonePayload::new(multi, "ab");
        assert_eq!(payload.version(), PayloadVersion::MultiSign);

        let bytes = payload.to_bytes().unwrap();
        let n = bytes.len();
        assert_eq!(&bytes[n - 12..n - 9], &[0, 0, 4]);
        assert_eq!(&bytes[n - 14..n - 12], &[0, 2]);
        assert_eq!(&bytes[n - 16..n - 14], b"ab");
        assert_eq!(bytes[n - 17], 2);
    }

    #[test]
    fn test_empty_single_sign_rejected() {
        let payload = RedstonePayload::new(Vec::<SignedDataPackage>::new(), "");
        assert_eq!(payload.to_bytes(), Err(Error::NoDataPackages));
    }

    #[test]
    fn test_ambiguous_metadata_rejected() {
        assert_eq!(single("x\0\u{2}").to_bytes(), Err(Error::AmbiguousMetadata));
        assert_eq!(single("\0\u{2}").to_bytes(), Err(Error::AmbiguousMetadata));
        // One byte short of a tag is fine
        assert!(single("\u{2}").to_bytes().is_ok());
        assert!(single("\u{2}\0").to_bytes().is_ok());
    }

    #[test]
    fn test_prepare_matches_to_bytes() {
        let payload = single("meta");
        let signed = match &payload.packages {
            PayloadPackages::SingleSign(p) => p.clone(),
            PayloadPackages::MultiSign(_) => unreachable!(),
        };
        assert_eq!(prepare(signed, "meta").unwrap(), payload.to_bytes().unwrap());
    }

    #[test]
    fn test_recover_signers_per_package() {
        let a = SignedDataPackage::sign(&package(1), &keypair(1)).unwrap();
        let b = SignedDataPackage::sign(&package(2), &keypair(2)).unwrap();
        let payload = RedstonePayload::new(vec![a, b], "");
        assert_eq!(
            payload.recover_signers().unwrap(),
            vec![vec![keypair(1).address()], vec![keypair(2).address()]]
        );
    }

    #[test]
    fn test_from_bytes_rejects_prefix() {
        let mut bytes = vec![0xaa];
        bytes.extend(single("").to_bytes().unwrap());
        assert!(matches!(
            RedstonePayload::from_bytes(&bytes),
            Err(Error::Core(CoreError::MalformedField { field: "payload", .. }))
        ));
        assert_eq!(RedstonePayload::from_bytes(&bytes[1..]).unwrap(), single(""));
    }
}
