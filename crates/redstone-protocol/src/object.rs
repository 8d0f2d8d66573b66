//! Object interchange form for JSON transports.
//!
//! Mirrors the byte form field by field, so converting to an object and
//! back, then serializing, yields the same bytes:
//!
//! ```json
//! {
//!   "version": 1,
//!   "unsignedMetadata": "1.0.0#test",
//!   "dataPackages": [
//!     {
//!       "dataPoints": [{ "dataFeedId": "BTC", "value": "AAAA...EAA=" }],
//!       "timestampMilliseconds": 1654353400000,
//!       "signature": "BH8O...Gw=="
//!     }
//!   ]
//! }
//! ```
//!
//! Version 2 payloads carry a single `multiSignDataPackage` with a
//! `signatures` array instead of `dataPackages`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use redstone_protocol_core::constants::{FEED_ID_BS, SIGNATURE_BS};
use redstone_protocol_core::{
    DataPackage, DataPoint, EcdsaSignature, FeedId, MultiSignDataPackage, SignedDataPackage,
};

use crate::error::{Error, Result};
use crate::payload::{PayloadPackages, PayloadVersion, RedstonePayload};

/// A data point in object form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPointObject {
    /// The feed id text, or `0x` and 64 hex digits for hashed ids.
    pub data_feed_id: String,
    /// Value bytes: base64 on output, base64 or `0x` hex on input.
    pub value: String,
}

/// A data package in object form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPackageObject {
    pub data_points: Vec<DataPointObject>,
    pub timestamp_milliseconds: u64,
}

/// A single-signed package in object form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedDataPackageObject {
    #[serde(flatten)]
    pub data_package: DataPackageObject,
    /// Base64 `r ‖ s ‖ v`.
    pub signature: String,
}

/// A multi-signed package in object form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSignDataPackageObject {
    #[serde(flatten)]
    pub data_package: DataPackageObject,
    /// Base64 signatures, in signing order.
    pub signatures: Vec<String>,
}

/// A whole payload in object form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadObject {
    pub version: u64,
    #[serde(default)]
    pub unsigned_metadata: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_packages: Vec<SignedDataPackageObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_sign_data_package: Option<MultiSignDataPackageObject>,
}

impl From<&DataPoint> for DataPointObject {
    fn from(point: &DataPoint) -> Self {
        Self {
            data_feed_id: feed_id_to_text(&point.feed_id),
            value: BASE64.encode(&point.value),
        }
    }
}

impl TryFrom<&DataPointObject> for DataPoint {
    type Error = Error;

    fn try_from(object: &DataPointObject) -> Result<Self> {
        let feed_id = feed_id_from_text(&object.data_feed_id)?;
        let value = decode_binary(&object.value, "value", None)?;
        Ok(DataPoint::new(feed_id, value))
    }
}

impl From<&DataPackage> for DataPackageObject {
    fn from(package: &DataPackage) -> Self {
        Self {
            data_points: package.data_points.iter().map(DataPointObject::from).collect(),
            timestamp_milliseconds: package.timestamp_ms,
        }
    }
}

impl TryFrom<&DataPackageObject> for DataPackage {
    type Error = Error;

    fn try_from(object: &DataPackageObject) -> Result<Self> {
        let points = object
            .data_points
            .iter()
            .map(DataPoint::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(DataPackage::new(points, object.timestamp_milliseconds))
    }
}

impl From<&SignedDataPackage> for SignedDataPackageObject {
    fn from(package: &SignedDataPackage) -> Self {
        Self {
            data_package: DataPackageObject::from(&package.data_package),
            signature: BASE64.encode(package.signature.as_bytes()),
        }
    }
}

impl TryFrom<&SignedDataPackageObject> for SignedDataPackage {
    type Error = Error;

    fn try_from(object: &SignedDataPackageObject) -> Result<Self> {
        let data_package = DataPackage::try_from(&object.data_package)?;
        let signature = decode_signature(&object.signature)?;
        Ok(SignedDataPackage::new(data_package, signature))
    }
}

impl From<&MultiSignDataPackage> for MultiSignDataPackageObject {
    fn from(package: &MultiSignDataPackage) -> Self {
        Self {
            data_package: DataPackageObject::from(&package.data_package),
            signatures: package
                .signatures
                .iter()
                .map(|sig| BASE64.encode(sig.as_bytes()))
                .collect(),
        }
    }
}

impl TryFrom<&MultiSignDataPackageObject> for MultiSignDataPackage {
    type Error = Error;

    fn try_from(object: &MultiSignDataPackageObject) -> Result<Self> {
        let data_package = DataPackage::try_from(&object.data_package)?;
        let signatures = object
            .signatures
            .iter()
            .map(|s| decode_signature(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(MultiSignDataPackage::new(data_package, signatures)?)
    }
}

impl RedstonePayload {
    /// Convert to the object form.
    pub fn to_object(&self) -> PayloadObject {
        let (data_packages, multi_sign_data_package) = match &self.packages {
            PayloadPackages::SingleSign(packages) => (
                packages.iter().map(SignedDataPackageObject::from).collect(),
                None,
            ),
            PayloadPackages::MultiSign(package) => {
                (Vec::new(), Some(MultiSignDataPackageObject::from(package)))
            }
        };
        PayloadObject {
            version: u64::from(self.version().number()),
            unsigned_metadata: self.unsigned_metadata.clone(),
            data_packages,
            multi_sign_data_package,
        }
    }

    /// Rebuild a payload from its object form.
    pub fn from_object(object: &PayloadObject) -> Result<Self> {
        let packages = match PayloadVersion::from_number(object.version)? {
            PayloadVersion::SingleSign => {
                if object.data_packages.is_empty() {
                    return Err(Error::NoDataPackages);
                }
                let packages = object
                    .data_packages
                    .iter()
                    .map(SignedDataPackage::try_from)
                    .collect::<Result<Vec<_>>>()?;
                PayloadPackages::SingleSign(packages)
            }
            PayloadVersion::MultiSign => {
                let package = object.multi_sign_data_package.as_ref().ok_or_else(|| {
                    Error::Object("version 2 payload without multiSignDataPackage".to_string())
                })?;
                PayloadPackages::MultiSign(MultiSignDataPackage::try_from(package)?)
            }
        };
        Ok(RedstonePayload {
            packages,
            unsigned_metadata: object.unsigned_metadata.clone(),
        })
    }

    /// Serialize the object form as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_object())?)
    }

    /// Parse the JSON object form.
    pub fn from_json(json: &str) -> Result<Self> {
        let object: PayloadObject = serde_json::from_str(json)?;
        Self::from_object(&object)
    }
}

fn feed_id_to_text(feed_id: &FeedId) -> String {
    feed_id
        .label()
        .unwrap_or_else(|| format!("0x{}", feed_id.to_hex()))
}

/// Full-width hex is taken as raw bytes; anything else is feed id text.
fn feed_id_from_text(text: &str) -> Result<FeedId> {
    if let Some(digits) = text.strip_prefix("0x") {
        if digits.len() == 2 * FEED_ID_BS {
            let bytes = hex::decode(digits)
                .map_err(|e| Error::Object(format!("invalid dataFeedId hex: {e}")))?;
            return Ok(FeedId::from_slice(&bytes)?);
        }
    }
    Ok(FeedId::encode(text))
}

/// Base64 wins; `0x` hex is only tried when the text is not base64 of
/// the expected length. Base64 output may itself start with `0x`.
fn decode_binary(text: &str, field: &str, expected_len: Option<usize>) -> Result<Vec<u8>> {
    match BASE64.decode(text) {
        Ok(bytes) if expected_len.map_or(true, |len| bytes.len() == len) => Ok(bytes),
        decoded => match text.strip_prefix("0x").map(hex::decode) {
            Some(Ok(bytes)) => Ok(bytes),
            _ => decoded.map_err(|e| Error::Object(format!("invalid {field} base64: {e}"))),
        },
    }
}

fn decode_signature(text: &str) -> Result<EcdsaSignature> {
    let bytes = decode_binary(text, "signature", Some(SIGNATURE_BS))?;
    Ok(EcdsaSignature::from_slice(&bytes)?)
}
