//! Cryptographic primitives: Keccak-256 hashing and recoverable secp256k1
//! signatures.
//!
//! The raw 32-byte hash is signed directly. There is no personal-message
//! prefix, so this scheme must never be used to sign attacker-chosen text.

use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use std::fmt;

use crate::constants::SIGNATURE_BS;
use crate::error::{CoreError, Result};
use crate::types::SignerAddress;

/// Offset added to the recovery id in the `v` byte.
const V_OFFSET: u8 = 27;

/// A 32-byte Keccak-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keccak256Hash(pub [u8; 32]);

impl Keccak256Hash {
    /// Compute the Keccak-256 hash of data.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Keccak256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keccak256({}...)", &self.to_hex()[..8])
    }
}

impl AsRef<[u8]> for Keccak256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Keccak256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 65-byte recoverable ECDSA signature: `r(32) ‖ s(32) ‖ v(1)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EcdsaSignature(pub [u8; SIGNATURE_BS]);

impl EcdsaSignature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; SIGNATURE_BS]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly 65 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; SIGNATURE_BS] =
            bytes.try_into().map_err(|_| CoreError::MalformedField {
                field: "signature",
                expected: SIGNATURE_BS,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_BS] {
        &self.0
    }

    /// The `v` byte.
    pub const fn v(&self) -> u8 {
        self.0[SIGNATURE_BS - 1]
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Recover the address of whoever produced this signature over `hash`.
    ///
    /// No public key is needed: the signature alone identifies the signer.
    /// A tampered hash does not fail here, it recovers a different address.
    pub fn recover(&self, hash: &Keccak256Hash) -> Result<SignerAddress> {
        let mut signature =
            K256Signature::from_slice(&self.0[..64]).map_err(|_| CoreError::InvalidSignature)?;

        let mut recovery_byte = match self.v() {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - V_OFFSET,
            _ => return Err(CoreError::InvalidSignature),
        };
        // k256 only recovers from low-s signatures. Negating s mirrors R,
        // so the parity of the recovery id flips with it.
        if let Some(normalized) = signature.normalize_s() {
            signature = normalized;
            recovery_byte ^= 1;
        }
        let recovery_id = RecoveryId::from_byte(recovery_byte).ok_or(CoreError::InvalidSignature)?;

        let verifying_key =
            VerifyingKey::recover_from_prehash(hash.as_bytes(), &signature, recovery_id)
                .map_err(|_| CoreError::InvalidSignature)?;

        Ok(address_of(&verifying_key))
    }
}

impl fmt::Debug for EcdsaSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sig({}...)", &self.to_hex()[..8])
    }
}

impl AsRef<[u8]> for EcdsaSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; SIGNATURE_BS]> for EcdsaSignature {
    fn from(bytes: [u8; SIGNATURE_BS]) -> Self {
        Self(bytes)
    }
}

/// Derive the 20-byte address: the last 20 bytes of
/// `keccak256(uncompressed_pubkey[1..])`.
fn address_of(key: &VerifyingKey) -> SignerAddress {
    let point = key.to_encoded_point(false);
    let hash = Keccak256Hash::hash(&point.as_bytes()[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash.0[12..]);
    SignerAddress(addr)
}

/// The signer capability: anything that can sign a hash and name its address.
///
/// Key custody lives behind this trait; the protocol never sees raw keys.
pub trait PackageSigner {
    /// Sign a 32-byte hash, producing a recoverable signature.
    fn sign_hash(&self, hash: &Keccak256Hash) -> Result<EcdsaSignature>;

    /// The address recovered from this signer's signatures.
    fn address(&self) -> SignerAddress;
}

impl<T: PackageSigner + ?Sized> PackageSigner for &T {
    fn sign_hash(&self, hash: &Keccak256Hash) -> Result<EcdsaSignature> {
        (**self).sign_hash(hash)
    }

    fn address(&self) -> SignerAddress {
        (**self).address()
    }
}

/// A secp256k1 keypair for signing data packages.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::random(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte secret scalar.
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|_| CoreError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Parse a hex-encoded secret, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| CoreError::InvalidPrivateKey)?;
        let secret: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::InvalidPrivateKey)?;
        Self::from_bytes(&secret)
    }

    /// The address derived from this keypair's public key.
    pub fn address(&self) -> SignerAddress {
        address_of(self.signing_key.verifying_key())
    }

    /// Sign a hash (RFC 6979 deterministic nonce, low-s, `v = 27 + recid`).
    pub fn sign_hash(&self, hash: &Keccak256Hash) -> Result<EcdsaSignature> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash.as_bytes())
            .map_err(|_| CoreError::InvalidSignature)?;

        let mut bytes = [0u8; SIGNATURE_BS];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = V_OFFSET + recovery_id.to_byte();
        Ok(EcdsaSignature(bytes))
    }
}

impl PackageSigner for Keypair {
    fn sign_hash(&self, hash: &Keccak256Hash) -> Result<EcdsaSignature> {
        Keypair::sign_hash(self, hash)
    }

    fn address(&self) -> SignerAddress {
        Keypair::address(self)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARDHAT_KEY_0: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_keccak_known_vectors() {
        assert_eq!(
            Keccak256Hash::hash(b"").to_hex(),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            Keccak256Hash::hash(b"abc").to_hex(),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn test_address_from_known_key() {
        let keypair = Keypair::from_hex(HARDHAT_KEY_0).unwrap();
        assert_eq!(
            keypair.address().to_checksum(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_sign_recover() {
        let keypair = Keypair::generate();
        let hash = Keccak256Hash::hash(b"hello world");
        let signature = keypair.sign_hash(&hash).unwrap();

        assert!(signature.v() == 27 || signature.v() == 28);
        assert_eq!(signature.recover(&hash).unwrap(), keypair.address());

        // A different hash recovers someone else (or nobody)
        let other = Keccak256Hash::hash(b"hello worlD");
        match signature.recover(&other) {
            Ok(addr) => assert_ne!(addr, keypair.address()),
            Err(e) => assert_eq!(e, CoreError::InvalidSignature),
        }
    }

    #[test]
    fn test_signing_is_deterministic() {
        let keypair = Keypair::from_hex(HARDHAT_KEY_0).unwrap();
        let hash = Keccak256Hash::hash(b"data");
        assert_eq!(keypair.sign_hash(&hash).unwrap(), keypair.sign_hash(&hash).unwrap());
    }

    #[test]
    fn test_recover_accepts_raw_recovery_id() {
        let keypair = Keypair::generate();
        let hash = Keccak256Hash::hash(b"v byte");
        let mut signature = keypair.sign_hash(&hash).unwrap();
        signature.0[64] -= 27;
        assert_eq!(signature.recover(&hash).unwrap(), keypair.address());
    }

    #[test]
    fn test_recover_accepts_high_s() {
        use num_bigint::BigUint;

        let keypair = Keypair::from_bytes(&[7u8; 32]).unwrap();
        let hash = Keccak256Hash::hash(b"malleable");
        let low = keypair.sign_hash(&hash).unwrap();

        let order = BigUint::parse_bytes(
            b"FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141",
            16,
        )
        .unwrap();
        let high_s = (order - BigUint::from_bytes_be(&low.0[32..64])).to_bytes_be();

        let mut bytes = low.0;
        bytes[32..64].fill(0);
        bytes[64 - high_s.len()..64].copy_from_slice(&high_s);
        bytes[64] = if low.v() == 27 { 28 } else { 27 };
        let high = EcdsaSignature::from_bytes(bytes);

        assert_ne!(high, low);
        assert_eq!(high.recover(&hash).unwrap(), keypair.address());
    }

    #[test]
    fn test_recover_rejects_bad_v() {
        let keypair = Keypair::generate();
        let hash = Keccak256Hash::hash(b"v byte");
        let mut signature = keypair.sign_hash(&hash).unwrap();
        signature.0[64] = 35;
        assert_eq!(signature.recover(&hash), Err(CoreError::InvalidSignature));
    }

    #[test]
    fn test_recover_rejects_zero_signature() {
        let signature = EcdsaSignature::from_bytes([0u8; SIGNATURE_BS]);
        let hash = Keccak256Hash::hash(b"anything");
        assert_eq!(signature.recover(&hash), Err(CoreError::InvalidSignature));
    }

    #[test]
    fn test_signature_from_slice_checks_width() {
        let err = EcdsaSignature::from_slice(&[0u8; 64]).unwrap_err();
        assert_eq!(
            err,
            CoreError::MalformedField {
                field: "signature",
                expected: 65,
                actual: 64
            }
        );
    }

    #[test]
    fn test_invalid_private_keys() {
        assert_eq!(
            Keypair::from_bytes(&[0u8; 32]).unwrap_err(),
            CoreError::InvalidPrivateKey
        );
        assert!(Keypair::from_hex("0x1234").is_err());
        assert!(Keypair::from_hex("not hex").is_err());
    }
}
