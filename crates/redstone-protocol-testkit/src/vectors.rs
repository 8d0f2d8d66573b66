//! Golden test vectors for cross-implementation conformance.
//!
//! Every implementation of the payload format must reproduce these bytes
//! exactly: package bytes, signable hash, signatures (RFC 6979, low-s) and
//! the complete payload for both generations.

use redstone_protocol::{PayloadVersion, RedstonePayload};
use redstone_protocol_core::{
    DataPackage, DataPoint, Keccak256Hash, Keypair, MultiSignDataPackage, NumericEncoding,
    SignedDataPackage,
};
use rust_decimal::Decimal;

/// Hardhat development account #0.
pub const HARDHAT_KEY_0: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
/// Address of [`HARDHAT_KEY_0`].
pub const HARDHAT_ADDRESS_0: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Hardhat development account #1.
pub const HARDHAT_KEY_1: &str =
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
/// Address of [`HARDHAT_KEY_1`].
pub const HARDHAT_ADDRESS_1: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

/// A feed id too long to pad, and its hashed encoding.
pub const LONG_FEED_ID: &str = "a-feed-identifier-longer-than-31-bytes";
pub const LONG_FEED_ID_ENCODED: &str =
    "bf1698e15c16e3e0ac2c38d8469aaa42331b744051f870c0ebf7428afa61708d";

const BTC_ETH_PACKAGE: &str = concat!(
    "000000000000000000000000000000000000000000000000000003d1e3821000",
    "4254430000000000000000000000000000000000000000000000000000000000",
    "0000000000000000000000000000000000000000000000000000002e90edd000",
    "4554480000000000000000000000000000000000000000000000000000000000",
    "01812f2590c0",
    "00000020",
    "000002",
);

const BTC_ETH_HASH: &str = "466d5d4a48a2e0448d788584dae008787f4318ac62f82529e16be3e0a62d0026";

const SIG_KEY_0: &str = concat!(
    "047f0ea23f909f6ecec327b0c115975cd1217e6a1b7ff66f371ae4fb577f9038",
    "1ce0b5dfd34a2a4f253e3a599982dac791d0127e16ef15afe2ceebde614d2def",
    "1c",
);

const SIG_KEY_1: &str = concat!(
    "77a0af79beee5155fffc1762f1e05d53b3a52af6d80fcb73367d3ad1f80448b0",
    "24c1075a60639fb8a2c712c760e018c13a5767b022e893acea7464be1db0c6d2",
    "1c",
);

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Hex secret keys, in signing order.
    pub keys: &'static [&'static str],
    /// Feed ids and whole-number values, in submission order.
    pub data_points: &'static [(&'static str, i64)],
    /// Package timestamp.
    pub timestamp_ms: u64,
    /// Unsigned metadata text.
    pub unsigned_metadata: &'static str,
    /// Payload generation.
    pub version: PayloadVersion,
    /// Expected canonical package bytes (hex).
    pub expected_package: &'static str,
    /// Expected signable hash (hex).
    pub expected_signable_hash: &'static str,
    /// Expected signatures, one per key (hex).
    pub expected_signatures: &'static [&'static str],
    /// Expected payload bytes (hex).
    pub expected_payload: &'static str,
    /// Expected Keccak-256 of the payload bytes (hex).
    pub expected_payload_hash: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "single-sign BTC/ETH",
            keys: &[HARDHAT_KEY_0],
            // Submitted out of canonical order on purpose
            data_points: &[("ETH", 2000), ("BTC", 42000)],
            timestamp_ms: 1654353400000,
            unsigned_metadata: "1.0.0#test",
            version: PayloadVersion::SingleSign,
            expected_package: BTC_ETH_PACKAGE,
            expected_signable_hash: BTC_ETH_HASH,
            expected_signatures: &[SIG_KEY_0],
            expected_payload: concat!(
                "000000000000000000000000000000000000000000000000000003d1e3821000",
                "4254430000000000000000000000000000000000000000000000000000000000",
                "0000000000000000000000000000000000000000000000000000002e90edd000",
                "4554480000000000000000000000000000000000000000000000000000000000",
                "01812f2590c0",
                "00000020",
                "000002",
                "047f0ea23f909f6ecec327b0c115975cd1217e6a1b7ff66f371ae4fb577f9038",
                "1ce0b5dfd34a2a4f253e3a599982dac791d0127e16ef15afe2ceebde614d2def",
                "1c",
                "0001",
                "312e302e302374657374",
                "00000a",
                "000002ed57011e0000",
            ),
            expected_payload_hash:
                "f69c40fcf11491c3be52ebe1922ba2502592c0648ded7cbf84a37b47b6976387",
        },
        GoldenVector {
            name: "multi-sign BTC/ETH",
            keys: &[HARDHAT_KEY_0, HARDHAT_KEY_1],
            data_points: &[("BTC", 42000), ("ETH", 2000)],
            timestamp_ms: 1654353400000,
            unsigned_metadata: "cosign",
            version: PayloadVersion::MultiSign,
            expected_package: BTC_ETH_PACKAGE,
            expected_signable_hash: BTC_ETH_HASH,
            expected_signatures: &[SIG_KEY_0, SIG_KEY_1],
            expected_payload: concat!(
                "000000000000000000000000000000000000000000000000000003d1e3821000",
                "4254430000000000000000000000000000000000000000000000000000000000",
                "0000000000000000000000000000000000000000000000000000002e90edd000",
                "4554480000000000000000000000000000000000000000000000000000000000",
                "01812f2590c0",
                "00000020",
                "000002",
                "047f0ea23f909f6ecec327b0c115975cd1217e6a1b7ff66f371ae4fb577f9038",
                "1ce0b5dfd34a2a4f253e3a599982dac791d0127e16ef15afe2ceebde614d2def",
                "1c",
                "77a0af79beee5155fffc1762f1e05d53b3a52af6d80fcb73367d3ad1f80448b0",
                "24c1075a60639fb8a2c712c760e018c13a5767b022e893acea7464be1db0c6d2",
                "1c",
                "02",
                "636f7369676e",
                "0002",
                "000008",
                "000002ed57011e0000",
            ),
            expected_payload_hash:
                "b98ee822ee438f9ee96cdfa4b6df9e0a94341546605bab2b2f19c1caca2fbff4",
        },
    ]
}

/// Keypairs of a vector, in signing order.
pub fn keypairs_from_vector(vector: &GoldenVector) -> Vec<Keypair> {
    vector
        .keys
        .iter()
        .map(|k| Keypair::from_hex(k).expect("golden key is valid"))
        .collect()
}

/// Build the unsigned package of a vector, in submission order.
pub fn package_from_vector(vector: &GoldenVector) -> DataPackage {
    let encoding = NumericEncoding::default();
    let points = vector
        .data_points
        .iter()
        .map(|(feed, value)| {
            DataPoint::numeric(*feed, Decimal::from(*value), &encoding)
                .expect("golden value fits")
        })
        .collect();
    DataPackage::new(points, vector.timestamp_ms)
}

/// Sign and wrap a vector into a payload.
pub fn payload_from_vector(vector: &GoldenVector) -> RedstonePayload {
    let package = package_from_vector(vector);
    let keypairs = keypairs_from_vector(vector);
    match vector.version {
        PayloadVersion::SingleSign => {
            let signed = keypairs
                .iter()
                .map(|kp| SignedDataPackage::sign(&package, kp).expect("golden package is valid"))
                .collect::<Vec<_>>();
            RedstonePayload::new(signed, vector.unsigned_metadata)
        }
        PayloadVersion::MultiSign => {
            let multi = MultiSignDataPackage::sign(&package, &keypairs)
                .expect("golden package is valid");
            RedstonePayload::new(multi, vector.unsigned_metadata)
        }
    }
}

/// Check every vector against this implementation.
///
/// Returns `(name, matches, payload hex)` for each vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let bytes = payload_from_vector(v)
                .to_bytes()
                .expect("golden payload serializes");
            let hex = hex::encode(&bytes);
            let matches = hex == v.expected_payload
                && Keccak256Hash::hash(&bytes).to_hex() == v.expected_payload_hash;
            (v.name.to_string(), matches, hex)
        })
        .collect()
}
