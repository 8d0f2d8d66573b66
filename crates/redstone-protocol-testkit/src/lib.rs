//! # RedStone Protocol Testkit
//!
//! Testing utilities for the RedStone payload protocol.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed inputs with expected bytes for cross-implementation conformance
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helpers for setting up signers, packages and payloads
//!
//! ## Golden Vectors
//!
//! ```rust
//! use redstone_protocol_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, hex) in verify_all_vectors() {
//!     assert!(matches, "{name}: {hex}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use redstone_protocol::parse;
//! use redstone_protocol_testkit::generators::{payload_from_params, PayloadParams};
//!
//! proptest! {
//!     #[test]
//!     fn payload_roundtrips(params: PayloadParams) {
//!         let payload = payload_from_params(&params);
//!         let parsed = parse(&payload.to_bytes().unwrap()).unwrap();
//!         prop_assert_eq!(parsed.payload, payload);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use redstone_protocol_testkit::fixtures::{btc_eth_package, TestFixture};
//!
//! let fixture = TestFixture::new(3);
//! let payload = fixture.multi_sign_payload(&btc_eth_package(), "fixture");
//! assert_eq!(payload.recover_signers().unwrap()[0].len(), 3);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{btc_eth_package, calldata_prefix, TestFixture, TEST_DATA_SERVICE};
pub use generators::{payload_from_params, PayloadParams};
pub use vectors::{all_vectors, payload_from_vector, verify_all_vectors, GoldenVector};
