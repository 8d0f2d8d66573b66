//! # RedStone Protocol Core
//!
//! Pure primitives for the RedStone oracle payload format: data points,
//! data packages, and their signed forms.
//!
//! This crate contains no I/O and no global state. It is pure computation
//! over fixed-width byte layouts.
//!
//! ## Key Types
//!
//! - [`FeedId`] - 32-byte encoded data feed identifier
//! - [`DataPoint`] - A feed id paired with a fixed-width value
//! - [`DataPackage`] - Timestamped, canonically ordered data points
//! - [`SignedDataPackage`] - A package with one recoverable signature
//! - [`MultiSignDataPackage`] - A package cosigned by several signers
//!
//! ## Wire Format
//!
//! Every structure is laid out so it can be decoded backwards, from the end
//! of a buffer. See [`constants`] for the frozen field widths.

pub mod codec;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod cursor;
pub mod data_package;
pub mod data_point;
pub mod error;
pub mod signed;
pub mod types;

pub use codec::{decode_feed_id, decode_value, encode_feed_id, encode_value};
pub use config::NumericEncoding;
pub use crypto::{EcdsaSignature, Keccak256Hash, Keypair, PackageSigner};
pub use cursor::TailCursor;
pub use data_package::DataPackage;
pub use data_point::DataPoint;
pub use error::{CoreError, Result};
pub use signed::{MultiSignDataPackage, SignedDataPackage, MAX_SIGNERS};
pub use types::{FeedId, SignerAddress};
