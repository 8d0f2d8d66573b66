//! End-to-end payload tests: calldata composition, trust checks and
//! malformed input.

use redstone_protocol::core::constants::REDSTONE_MARKER;
use redstone_protocol::{
    authorize, parse, parse_with, CoreError, Error, ParserConfig, PayloadVersion,
    RedstonePayload, SignerPolicy, TrustError,
};
use redstone_protocol_testkit::fixtures::{
    btc_eth_package, calldata_prefix, TestFixture, TEST_DATA_SERVICE,
};
use rust_decimal::Decimal;

#[test]
fn test_calldata_composition() {
    let fixture = TestFixture::new(2);
    let payload = fixture.single_sign_payload(&btc_eth_package(), "1.0.0#integration");

    let mut calldata = calldata_prefix();
    calldata.extend(payload.to_bytes().unwrap());

    let parsed = parse(&calldata).unwrap();
    assert_eq!(parsed.remainder_prefix, calldata_prefix().as_slice());
    assert_eq!(parsed.payload, payload);
}

#[test]
fn test_prefix_ending_in_zeros() {
    let fixture = TestFixture::new(1);
    let payload = fixture.multi_sign_payload(&btc_eth_package(), "");
    let mut calldata = vec![0u8; 64];
    calldata.extend(payload.to_bytes().unwrap());

    let parsed = parse(&calldata).unwrap();
    assert_eq!(parsed.remainder_prefix, &[0u8; 64][..]);
    assert_eq!(parsed.payload.version(), PayloadVersion::MultiSign);
}

#[test]
fn test_authorize_single_sign() {
    let fixture = TestFixture::new(3);
    let payload = fixture.single_sign_payload(&btc_eth_package(), "");
    let bytes = payload.to_bytes().unwrap();
    let parsed = parse(&bytes).unwrap();

    let report = authorize(
        &parsed.payload,
        &fixture.allow_list(),
        &SignerPolicy::new(TEST_DATA_SERVICE, 3),
    )
    .unwrap();
    assert_eq!(report.authorized.len(), 3);
    assert!(report.unknown.is_empty());
}

#[test]
fn test_authorize_rejects_outsiders() {
    let trusted = TestFixture::new(2);
    let outsiders = TestFixture::new(3);
    let payload = outsiders.multi_sign_payload(&btc_eth_package(), "");

    let err = authorize(
        &payload,
        &trusted.allow_list(),
        &SignerPolicy::new(TEST_DATA_SERVICE, 1),
    )
    .unwrap_err();
    assert!(matches!(err, TrustError::InsufficientSigners { found: 0, .. }));
}

#[test]
fn test_metadata_is_not_signed() {
    let fixture = TestFixture::new(2);
    let payload = fixture.multi_sign_payload(&btc_eth_package(), "origin-a");
    let mut relayed = payload.clone();
    relayed.unsigned_metadata = "origin-b".to_string();

    let bytes = relayed.to_bytes().unwrap();
    let parsed = parse(&bytes).unwrap();
    assert_eq!(parsed.payload.unsigned_metadata, "origin-b");
    assert_eq!(
        parsed.payload.recover_signers().unwrap(),
        payload.recover_signers().unwrap()
    );
}

#[test]
fn test_many_packages() {
    let fixture = TestFixture::new(1);
    let packages: Vec<_> = (0..50u64)
        .map(|i| {
            let package =
                fixture.package(&[("ETH", Decimal::from(2000 + i))], 1654353400000 + i);
            fixture.sign(&package, 0)
        })
        .collect();
    let payload = RedstonePayload::new(packages, "bulk");
    let bytes = payload.to_bytes().unwrap();
    let parsed = parse(&bytes).unwrap();
    assert_eq!(parsed.payload, payload);

    let limited = ParserConfig {
        max_data_packages: 10,
        ..ParserConfig::default()
    };
    assert!(matches!(
        parse_with(&payload.to_bytes().unwrap(), &limited),
        Err(Error::LimitExceeded { count: 50, .. })
    ));
}

#[test]
fn test_rejects_marker_only() {
    assert!(matches!(
        parse(&REDSTONE_MARKER),
        Err(Error::Core(CoreError::TruncatedBuffer { .. }))
    ));
}

#[test]
fn test_every_truncation_is_rejected() {
    let fixture = TestFixture::new(2);
    let bytes = fixture
        .single_sign_payload(&btc_eth_package(), "meta")
        .to_bytes()
        .unwrap();

    // Cutting the tail removes the marker
    for cut in 1..REDSTONE_MARKER.len() {
        assert!(parse(&bytes[..bytes.len() - cut]).is_err());
    }
}
