//! Proptest generators for property-based testing.

use proptest::prelude::*;

use redstone_protocol::payload::RedstonePayload;
use redstone_protocol_core::constants::{MAX_TIMESTAMP_MS, REDSTONE_MARKER};
use redstone_protocol_core::{DataPackage, DataPoint, Keypair};

/// Generate a random valid keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_filter_map("scalar out of range", |secret| {
        Keypair::from_bytes(&secret).ok()
    })
}

/// Generate a feed id text. Long ones exercise the hashed encoding.
pub fn feed_id_text() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9_/.-]{0,44}".prop_map(String::from)
}

/// Generate a valid package timestamp.
pub fn timestamp_ms() -> impl Strategy<Value = u64> {
    0u64..=MAX_TIMESTAMP_MS
}

/// Generate a value byte width.
pub fn value_byte_width() -> impl Strategy<Value = usize> {
    1usize..=32
}

/// Generate printable unsigned metadata.
///
/// Printable text can never end in the multi-sign version tag.
pub fn unsigned_metadata() -> impl Strategy<Value = String> {
    "[ -~]{0,40}".prop_map(String::from)
}

/// Generate a non-empty prefix that does not end with the payload marker.
pub fn prefix() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=96)
        .prop_filter("prefix ends with marker", |p| !p.ends_with(&REDSTONE_MARKER))
}

/// Generate a valid data package: unique feed ids, one shared value width.
pub fn data_package() -> impl Strategy<Value = DataPackage> {
    (
        prop::collection::btree_set(feed_id_text(), 1..=8),
        value_byte_width(),
        timestamp_ms(),
    )
        .prop_flat_map(|(feeds, width, ts)| {
            let n = feeds.len();
            (
                Just(feeds),
                prop::collection::vec(prop::collection::vec(any::<u8>(), width), n),
                Just(ts),
            )
        })
        .prop_map(|(feeds, values, ts)| {
            let points = feeds
                .into_iter()
                .zip(values)
                .map(|(feed, value)| DataPoint::new(feed.as_str(), value))
                .collect();
            DataPackage::new(points, ts)
        })
}

/// A package together with a shuffled copy of its points.
pub fn shuffled_data_package() -> impl Strategy<Value = (DataPackage, DataPackage)> {
    data_package().prop_flat_map(|package| {
        let ts = package.timestamp_ms;
        let shuffled = Just(package.data_points.clone()).prop_shuffle();
        (Just(package), shuffled.prop_map(move |points| DataPackage::new(points, ts)))
    })
}

/// Parameters for generating a payload.
#[derive(Debug, Clone)]
pub struct PayloadParams {
    pub packages: Vec<DataPackage>,
    pub signers: Vec<Keypair>,
    pub unsigned_metadata: String,
    pub multi_sign: bool,
}

impl Arbitrary for PayloadParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            prop::collection::vec(data_package(), 1..=4),
            prop::collection::vec(keypair(), 1..=4),
            unsigned_metadata(),
            any::<bool>(),
        )
            .prop_map(|(packages, signers, unsigned_metadata, multi_sign)| PayloadParams {
                packages,
                signers,
                unsigned_metadata,
                multi_sign,
            })
            .boxed()
    }
}

/// Build a payload from parameters.
///
/// Single-sign payloads sign package `i` with signer `i % signers`; a
/// multi-sign payload has every signer cosign the first package.
pub fn payload_from_params(params: &PayloadParams) -> RedstonePayload {
    use redstone_protocol_core::{MultiSignDataPackage, SignedDataPackage};

    if params.multi_sign {
        let multi = MultiSignDataPackage::sign(&params.packages[0], &params.signers)
            .expect("generated package is valid");
        RedstonePayload::new(multi, params.unsigned_metadata.clone())
    } else {
        let signed = params
            .packages
            .iter()
            .enumerate()
            .map(|(i, package)| {
                let signer = &params.signers[i % params.signers.len()];
                SignedDataPackage::sign(package, signer).expect("generated package is valid")
            })
            .collect::<Vec<_>>();
        RedstonePayload::new(signed, params.unsigned_metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redstone_protocol::parser::parse;
    use redstone_protocol_core::{CoreError, MultiSignDataPackage, SignedDataPackage};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_package_roundtrip(package in data_package()) {
            let canonical = package.canonicalized().unwrap();
            let bytes = package.to_bytes().unwrap();
            prop_assert_eq!(DataPackage::from_bytes(&bytes).unwrap(), canonical);
        }

        #[test]
        fn test_order_independence((original, shuffled) in shuffled_data_package()) {
            prop_assert_eq!(original.to_bytes().unwrap(), shuffled.to_bytes().unwrap());
            prop_assert_eq!(
                original.signable_hash().unwrap(),
                shuffled.signable_hash().unwrap()
            );
        }

        #[test]
        fn test_duplicate_rejected(package in data_package(), extra in any::<u8>()) {
            let mut package = package;
            let mut dup = package.data_points[0].clone();
            let mut value = dup.value.to_vec();
            value[0] = extra;
            dup.value = value.into();
            package.data_points.push(dup);
            prop_assert!(matches!(package.to_bytes(), Err(CoreError::DuplicateFeedId(_))));
        }

        #[test]
        fn test_tamper_detection(
            package in data_package(),
            signer in keypair(),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let signed = SignedDataPackage::sign(&package, &signer).unwrap();
            let mut bytes = signed.to_bytes().unwrap();
            // Points and timestamp, not the width/count fields or signature
            let covered = signed.data_package.encoded_len() - 7;
            bytes[index.index(covered)] ^= 1 << bit;

            // Tampering either breaks decoding or changes the signer
            if let Ok(tampered) = SignedDataPackage::from_bytes(&bytes) {
                match tampered.recover_signer_address() {
                    Ok(address) => prop_assert_ne!(address, signer.address()),
                    Err(e) => prop_assert_eq!(e, CoreError::InvalidSignature),
                }
            }
        }

        #[test]
        fn test_multi_sign_order(
            package in data_package(),
            signers in prop::collection::vec(keypair(), 1..=6),
        ) {
            let multi = MultiSignDataPackage::sign(&package, &signers).unwrap();
            let decoded = MultiSignDataPackage::from_bytes(&multi.to_bytes().unwrap()).unwrap();
            let expected: Vec<_> = signers.iter().map(Keypair::address).collect();
            prop_assert_eq!(decoded.recover_signer_addresses().unwrap(), expected);
        }

        #[test]
        fn test_payload_roundtrip(params: PayloadParams) {
            let payload = payload_from_params(&params);
            let bytes = payload.to_bytes().unwrap();
            let parsed = parse(&bytes).unwrap();
            prop_assert_eq!(parsed.payload, payload);
            prop_assert!(parsed.remainder_prefix.is_empty());
        }

        #[test]
        fn test_trailer_composability(params: PayloadParams, prefix in prefix()) {
            let payload = payload_from_params(&params);
            let mut buffer = prefix.clone();
            buffer.extend(payload.to_bytes().unwrap());

            let parsed = parse(&buffer).unwrap();
            prop_assert_eq!(parsed.remainder_prefix, prefix.as_slice());
            prop_assert_eq!(parsed.payload, payload);
        }

        #[test]
        fn test_object_roundtrip(params: PayloadParams) {
            let payload = payload_from_params(&params);
            let back = RedstonePayload::from_json(&payload.to_json().unwrap()).unwrap();
            prop_assert_eq!(back.to_bytes().unwrap(), payload.to_bytes().unwrap());
        }
    }
}
