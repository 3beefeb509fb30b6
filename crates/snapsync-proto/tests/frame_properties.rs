//! Property-based tests for frame and payload encoding/decoding.
//!
//! These verify serialization for ALL valid inputs, not just specific
//! examples: round-trips must be identity, and corrupted headers must be
//! rejected with the right error.

use bytes::Bytes;
use proptest::prelude::*;
use snapsync_proto::{Frame, FrameHeader, FrameType, Offer, ProtocolError};

/// Strategy for generating arbitrary frame types
fn arbitrary_frame_type() -> impl Strategy<Value = FrameType> {
    prop_oneof![
        Just(FrameType::Hello),
        Just(FrameType::Offer),
        Just(FrameType::Accept),
        Just(FrameType::Data),
        Just(FrameType::Done),
        Just(FrameType::Error),
    ]
}

/// Strategy for generating arbitrary frames with payloads
fn arbitrary_frame() -> impl Strategy<Value = Frame> {
    (arbitrary_frame_type(), prop::collection::vec(any::<u8>(), 0..4096))
        .prop_map(|(frame_type, payload)| Frame::new(frame_type, Bytes::from(payload)))
}

#[test]
fn prop_frame_encode_decode_roundtrip() {
    proptest!(|(frame in arbitrary_frame())| {
        let mut wire = Vec::new();
        frame.encode(&mut wire).expect("encode should succeed");

        let decoded = Frame::decode(&wire).expect("decode should succeed");

        // PROPERTY: Round-trip must be identity
        prop_assert_eq!(decoded.type_code, frame.type_code);
        prop_assert_eq!(decoded.payload, frame.payload);
    });
}

#[test]
fn prop_corrupted_magic_is_rejected() {
    proptest!(|(frame in arbitrary_frame(), byte in 0usize..4, corruption in 1u8..=255)| {
        let mut wire = Vec::new();
        frame.encode(&mut wire).expect("encode should succeed");
        wire[byte] = wire[byte].wrapping_add(corruption);

        prop_assert_eq!(Frame::decode(&wire), Err(ProtocolError::InvalidMagic));
    });
}

#[test]
fn prop_wrong_version_is_rejected() {
    proptest!(|(frame in arbitrary_frame(), version in 0u16..=u16::MAX)| {
        prop_assume!(version != FrameHeader::VERSION);

        let mut wire = Vec::new();
        frame.encode(&mut wire).expect("encode should succeed");
        wire[4..6].copy_from_slice(&version.to_be_bytes());

        prop_assert_eq!(Frame::decode(&wire), Err(ProtocolError::UnsupportedVersion(version)));
    });
}

#[test]
fn prop_nonzero_reserved_is_rejected() {
    proptest!(|(frame in arbitrary_frame(), reserved in 1u32..=u32::MAX)| {
        let mut wire = Vec::new();
        frame.encode(&mut wire).expect("encode should succeed");
        wire[12..16].copy_from_slice(&reserved.to_be_bytes());

        prop_assert_eq!(Frame::decode(&wire), Err(ProtocolError::ReservedNonZero(reserved)));
    });
}

#[test]
fn prop_oversized_length_is_rejected() {
    proptest!(|(frame in arbitrary_frame(), excess in 1u32..1024)| {
        let mut wire = Vec::new();
        frame.encode(&mut wire).expect("encode should succeed");
        let oversized = FrameHeader::MAX_PAYLOAD_SIZE + excess;
        wire[8..12].copy_from_slice(&oversized.to_be_bytes());

        prop_assert!(matches!(
            Frame::decode(&wire),
            Err(ProtocolError::PayloadTooLarge { .. })
        ), "expected PayloadTooLarge error");
    });
}

#[test]
fn prop_offer_roundtrip() {
    proptest!(|(name in "[a-zA-Z0-9._ -]{1,64}", size in any::<u64>())| {
        let offer = Offer { name, size };
        let encoded = offer.encode().expect("encode should succeed");
        let decoded = Offer::decode(&encoded).expect("decode should succeed");
        prop_assert_eq!(decoded, offer);
    });
}

#[test]
fn prop_error_message_roundtrip() {
    proptest!(|(message in "[ -~]{1,128}")| {
        let encoded = snapsync_proto::encode_error_message(&message)
            .expect("encode should succeed");
        let decoded = snapsync_proto::decode_error_message(&encoded)
            .expect("decode should succeed");
        prop_assert_eq!(decoded, message);
    });
}

#[test]
fn max_payload_boundary_roundtrips() {
    let frame = Frame::new(FrameType::Data, vec![0xabu8; FrameHeader::MAX_PAYLOAD_SIZE as usize]);
    let mut wire = Vec::new();
    frame.encode(&mut wire).expect("boundary payload should encode");
    let decoded = Frame::decode(&wire).expect("boundary payload should decode");
    assert_eq!(decoded.payload.len(), FrameHeader::MAX_PAYLOAD_SIZE as usize);
}
