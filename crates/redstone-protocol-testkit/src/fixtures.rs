//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use redstone_protocol::trust::AllowList;
use redstone_protocol::RedstonePayload;
use redstone_protocol_core::{
    DataPackage, DataPoint, Keypair, MultiSignDataPackage, NumericEncoding, SignedDataPackage,
};
use rust_decimal::Decimal;

use crate::vectors::{HARDHAT_KEY_0, HARDHAT_KEY_1};

/// Data service id used by fixtures.
pub const TEST_DATA_SERVICE: &str = "redstone-test";

/// A set of signers and a numeric encoding.
pub struct TestFixture {
    pub signers: Vec<Keypair>,
    pub encoding: NumericEncoding,
}

impl TestFixture {
    /// Create a fixture with `n` random signers.
    pub fn new(n: usize) -> Self {
        Self {
            signers: (0..n).map(|_| Keypair::generate()).collect(),
            encoding: NumericEncoding::default(),
        }
    }

    /// Create a fixture with the two Hardhat development signers.
    pub fn hardhat() -> Self {
        Self {
            signers: [HARDHAT_KEY_0, HARDHAT_KEY_1]
                .iter()
                .map(|k| Keypair::from_hex(k).expect("hardhat key is valid"))
                .collect(),
            encoding: NumericEncoding::default(),
        }
    }

    /// Use a different numeric encoding.
    pub fn with_encoding(mut self, encoding: NumericEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Build a package from `(feed id, value)` pairs.
    pub fn package(&self, points: &[(&str, Decimal)], timestamp_ms: u64) -> DataPackage {
        let points = points
            .iter()
            .map(|(feed, value)| {
                DataPoint::numeric(*feed, *value, &self.encoding).expect("fixture value fits")
            })
            .collect();
        DataPackage::new(points, timestamp_ms)
    }

    /// Sign a package with one signer.
    pub fn sign(&self, package: &DataPackage, signer: usize) -> SignedDataPackage {
        SignedDataPackage::sign(package, &self.signers[signer]).expect("fixture package is valid")
    }

    /// Have every signer cosign a package.
    pub fn cosign(&self, package: &DataPackage) -> MultiSignDataPackage {
        MultiSignDataPackage::sign(package, &self.signers).expect("fixture package is valid")
    }

    /// One single-sign package per signer, all with the same content.
    pub fn single_sign_payload(&self, package: &DataPackage, metadata: &str) -> RedstonePayload {
        let signed = (0..self.signers.len())
            .map(|i| self.sign(package, i))
            .collect::<Vec<_>>();
        RedstonePayload::new(signed, metadata)
    }

    /// One package cosigned by every signer.
    pub fn multi_sign_payload(&self, package: &DataPackage, metadata: &str) -> RedstonePayload {
        RedstonePayload::new(self.cosign(package), metadata)
    }

    /// An allow list containing every fixture signer.
    pub fn allow_list(&self) -> AllowList {
        AllowList::new().with_signers(TEST_DATA_SERVICE, self.signers.iter().map(Keypair::address))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new(3)
    }
}

/// The BTC/ETH conformance package, in canonical order.
pub fn btc_eth_package() -> DataPackage {
    TestFixture::hardhat().package(
        &[("BTC", Decimal::from(42000)), ("ETH", Decimal::from(2000))],
        1654353400000,
    )
}

/// A typical calldata prefix: selector plus two ABI words.
pub fn calldata_prefix() -> Vec<u8> {
    let mut prefix = vec![0xa9, 0x05, 0x9c, 0xbb];
    prefix.extend_from_slice(&[0u8; 12]);
    prefix.extend_from_slice(&[0x11; 20]);
    prefix.extend_from_slice(&[0u8; 31]);
    prefix.push(0x64);
    prefix
}
