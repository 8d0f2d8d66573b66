//! Signed data packages.
//!
//! A signature covers `keccak256(data_package.to_bytes())`. The signer's
//! address is never stored: it is recovered from the signature and the
//! package bytes, so a package proves who produced it.

use crate::codec::write_uint;
use crate::constants::{SIGNATURE_BS, SIGNERS_COUNT_BS};
use crate::crypto::{EcdsaSignature, Keccak256Hash, PackageSigner};
use crate::cursor::TailCursor;
use crate::data_package::DataPackage;
use crate::error::{CoreError, Result};
use crate::types::SignerAddress;

/// Largest number of cosigners the signers count field can carry.
pub const MAX_SIGNERS: usize = (1 << (8 * SIGNERS_COUNT_BS)) - 1;

/// A data package with exactly one signature.
///
/// Serialized as `data_package ‖ signature(65)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDataPackage {
    /// The signed package, in canonical order.
    pub data_package: DataPackage,
    /// Signature over the package's signable hash.
    pub signature: EcdsaSignature,
}

impl SignedDataPackage {
    /// Canonicalize and sign a package.
    pub fn sign(data_package: &DataPackage, signer: &impl PackageSigner) -> Result<Self> {
        let data_package = data_package.canonicalized()?;
        let hash = data_package.signable_hash()?;
        let signature = signer.sign_hash(&hash)?;
        Ok(Self {
            data_package,
            signature,
        })
    }

    /// Attach an existing signature.
    pub fn new(data_package: DataPackage, signature: EcdsaSignature) -> Self {
        Self {
            data_package,
            signature,
        }
    }

    /// Recompute the hash from the package bytes and recover the signer.
    pub fn recover_signer_address(&self) -> Result<SignerAddress> {
        let hash = self.data_package.signable_hash()?;
        self.signature.recover(&hash)
    }

    /// Serialized length in bytes.
    pub fn encoded_len(&self) -> usize {
        self.data_package.encoded_len() + SIGNATURE_BS
    }

    /// Append the serialized package to `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(&self.data_package.to_bytes()?);
        buf.extend_from_slice(self.signature.as_bytes());
        Ok(())
    }

    /// Serialize to `data_package ‖ signature`.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Decode a signed package ending at the cursor position.
    pub fn read_from_tail(cursor: &mut TailCursor<'_>) -> Result<Self> {
        let signature = EcdsaSignature::from_slice(cursor.take(SIGNATURE_BS, "signature")?)?;
        let data_package = DataPackage::read_from_tail(cursor)?;
        Ok(Self {
            data_package,
            signature,
        })
    }

    /// Decode a signed package that occupies the whole buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = TailCursor::new(bytes);
        let package = Self::read_from_tail(&mut cursor)?;
        expect_fully_consumed(&cursor, bytes.len(), "signed data package")?;
        Ok(package)
    }
}

/// One canonical data package cosigned by several independent signers.
///
/// Serialized as `data_package ‖ signature(65) × k ‖ k(1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSignDataPackage {
    /// The cosigned package, in canonical order.
    pub data_package: DataPackage,
    /// Signatures in the order they were supplied.
    pub signatures: Vec<EcdsaSignature>,
}

impl MultiSignDataPackage {
    /// Canonicalize a package and have every signer sign it, in order.
    pub fn sign<S: PackageSigner>(data_package: &DataPackage, signers: &[S]) -> Result<Self> {
        let data_package = data_package.canonicalized()?;
        let hash = data_package.signable_hash()?;
        let signatures = signers
            .iter()
            .map(|signer| signer.sign_hash(&hash))
            .collect::<Result<Vec<_>>>()?;
        Self::new(data_package, signatures)
    }

    /// Attach existing signatures. At least one is required.
    pub fn new(data_package: DataPackage, signatures: Vec<EcdsaSignature>) -> Result<Self> {
        check_signer_count(signatures.len())?;
        Ok(Self {
            data_package,
            signatures,
        })
    }

    /// Add one more cosignature.
    pub fn add_signature(&mut self, signature: EcdsaSignature) -> Result<()> {
        check_signer_count(self.signatures.len() + 1)?;
        self.signatures.push(signature);
        Ok(())
    }

    /// Have another signer cosign the package.
    pub fn cosign(&mut self, signer: &impl PackageSigner) -> Result<()> {
        let hash = self.signable_hash()?;
        let signature = signer.sign_hash(&hash)?;
        self.add_signature(signature)
    }

    /// The hash every cosigner signs.
    pub fn signable_hash(&self) -> Result<Keccak256Hash> {
        self.data_package.signable_hash()
    }

    /// Recover every signer independently, preserving signature order.
    ///
    /// How many of these must be trusted is the caller's decision.
    pub fn recover_signer_addresses(&self) -> Result<Vec<SignerAddress>> {
        let hash = self.signable_hash()?;
        self.signatures.iter().map(|sig| sig.recover(&hash)).collect()
    }

    /// Serialized length in bytes.
    pub fn encoded_len(&self) -> usize {
        self.data_package.encoded_len() + self.signatures.len() * SIGNATURE_BS + SIGNERS_COUNT_BS
    }

    /// Append the serialized package to `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        check_signer_count(self.signatures.len())?;
        buf.extend_from_slice(&self.data_package.to_bytes()?);
        for signature in &self.signatures {
            buf.extend_from_slice(signature.as_bytes());
        }
        write_uint(
            buf,
            self.signatures.len() as u64,
            SIGNERS_COUNT_BS,
            "signers count",
        )
    }

    /// Serialize to `data_package ‖ signatures ‖ count`.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Decode a multi-signed package ending at the cursor position.
    pub fn read_from_tail(cursor: &mut TailCursor<'_>) -> Result<Self> {
        let count = cursor.take_count(SIGNERS_COUNT_BS, "signers count")?;
        if count == 0 {
            return Err(CoreError::EmptySignatureSet);
        }
        cursor.ensure(count, SIGNATURE_BS, "signatures")?;

        let mut signatures = Vec::with_capacity(count);
        for _ in 0..count {
            signatures.push(EcdsaSignature::from_slice(cursor.take(SIGNATURE_BS, "signature")?)?);
        }
        signatures.reverse();

        let data_package = DataPackage::read_from_tail(cursor)?;
        Ok(Self {
            data_package,
            signatures,
        })
    }

    /// Decode a multi-signed package that occupies the whole buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = TailCursor::new(bytes);
        let package = Self::read_from_tail(&mut cursor)?;
        expect_fully_consumed(&cursor, bytes.len(), "multi-sign data package")?;
        Ok(package)
    }
}

fn check_signer_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(CoreError::EmptySignatureSet);
    }
    if count > MAX_SIGNERS {
        return Err(CoreError::FieldOverflow {
            field: "signers count",
            value: count as u128,
            width: SIGNERS_COUNT_BS,
        });
    }
    Ok(())
}

fn expect_fully_consumed(cursor: &TailCursor<'_>, len: usize, field: &'static str) -> Result<()> {
    if cursor.remaining() != 0 {
        return Err(CoreError::MalformedField {
            field,
            expected: cursor.consumed(),
            actual: len,
        });
    }
    Ok(())
}
