//! # RedStone Protocol
//!
//! Build, parse and verify RedStone oracle payloads: signed price-data
//! packages framed as a trailer that can be appended to any byte blob,
//! typically contract calldata.
//!
//! ## Overview
//!
//! - **Packages**: canonical, timestamped data points signed with
//!   recoverable secp256k1 signatures (see [`core`])
//! - **Envelope**: packages plus unsigned metadata and a fixed marker
//! - **Parser**: recovers the envelope by walking backwards from the end of
//!   a buffer, returning whatever precedes it untouched
//! - **Trust**: checks recovered signers against a registry
//!
//! ## Usage
//!
//! ```rust
//! use redstone_protocol::core::{DataPackage, DataPoint, Keypair, NumericEncoding};
//! use redstone_protocol::{parse, RedstonePayload, SignedDataPackage};
//! use rust_decimal::Decimal;
//!
//! let encoding = NumericEncoding::default();
//! let package = DataPackage::new(
//!     vec![DataPoint::numeric("ETH", Decimal::from(2000), &encoding).unwrap()],
//!     1654353400000,
//! );
//! let keypair = Keypair::generate();
//! let signed = SignedDataPackage::sign(&package, &keypair).unwrap();
//!
//! let mut calldata = vec![0xab; 36];
//! calldata.extend(RedstonePayload::new(vec![signed], "1.0.0").to_bytes().unwrap());
//!
//! let parsed = parse(&calldata).unwrap();
//! assert_eq!(parsed.remainder_prefix, &[0xab; 36]);
//! assert_eq!(parsed.payload.recover_signers().unwrap(), vec![vec![keypair.address()]]);
//! ```

pub mod config;
pub mod error;
pub mod object;
pub mod parser;
pub mod payload;
pub mod trust;

// Re-export the core crate
pub use redstone_protocol_core as core;

pub use config::ParserConfig;
pub use error::{Error, Result};
pub use object::{
    DataPackageObject, DataPointObject, MultiSignDataPackageObject, PayloadObject,
    SignedDataPackageObject,
};
pub use parser::{parse, parse_with, ParsedPayload};
pub use payload::{prepare, PayloadPackages, PayloadVersion, RedstonePayload};
pub use trust::{authorize, AllowList, SignerPolicy, SignerRegistry, SignerReport, TrustError};

// Re-export commonly used core types
pub use redstone_protocol_core::{
    CoreError, DataPackage, DataPoint, EcdsaSignature, FeedId, Keccak256Hash, Keypair,
    MultiSignDataPackage, PackageSigner, SignedDataPackage, SignerAddress,
};
