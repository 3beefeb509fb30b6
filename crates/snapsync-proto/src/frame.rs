//! Frame type and fixed-header codec.
//!
//! A `Frame` is the transport unit: a 16-byte raw binary header (big endian)
//! followed by a variable-length payload. The header carries everything a
//! reader needs to validate and size the frame before touching the payload.

use bytes::{BufMut, Bytes};

use crate::{
    MAX_CHUNK_SIZE,
    errors::{ProtocolError, Result},
};

/// Message type codes carried in the frame header.
///
/// The wire field is a `u16`; codes outside this enum survive header
/// validation and are rejected by the session state machines instead, so a
/// newer peer's frames fail with a precise "unexpected frame" error rather
/// than a generic parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FrameType {
    /// Session start, empty payload.
    Hello = 1,
    /// File offer, payload is an encoded [`crate::Offer`].
    Offer = 2,
    /// Offer accepted, empty payload.
    Accept = 3,
    /// File contents chunk.
    Data = 4,
    /// Transfer complete, empty payload.
    Done = 5,
    /// Rejection or failure reason, payload is an encoded message.
    Error = 6,
}

impl FrameType {
    /// Map a wire code to a known frame type.
    #[must_use]
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Hello),
            2 => Some(Self::Offer),
            3 => Some(Self::Accept),
            4 => Some(Self::Data),
            5 => Some(Self::Done),
            6 => Some(Self::Error),
            _ => None,
        }
    }

    /// Wire code for this frame type.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }
}

/// Fixed 16-byte frame header (big-endian network byte order).
///
/// Layout on the wire:
///
/// | Offset | Size | Field          | Value                  |
/// |--------|------|----------------|------------------------|
/// | 0      | 4    | magic          | ASCII `SSYN`           |
/// | 4      | 2    | version        | 1                      |
/// | 6      | 2    | type           | frame type code        |
/// | 8      | 4    | payload length | 0..`MAX_PAYLOAD_SIZE`  |
/// | 12     | 4    | reserved       | must be zero           |
///
/// The reserved field exists for future extension and is validated strictly
/// so an incompatible peer fails loudly instead of being half-understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    type_code: u16,
    payload_len: u32,
}

impl FrameHeader {
    /// Size of the serialized header in bytes.
    pub const SIZE: usize = 16;

    /// Protocol magic, ASCII `SSYN`.
    pub const MAGIC: [u8; 4] = *b"SSYN";

    /// Current protocol version.
    pub const VERSION: u16 = 1;

    /// Largest payload a decoder accepts (1 MiB + 1 KiB).
    ///
    /// DATA frames are bounded by the tighter [`MAX_CHUNK_SIZE`]; the slack
    /// leaves room for OFFER/ERROR payloads without a second limit.
    pub const MAX_PAYLOAD_SIZE: u32 = MAX_CHUNK_SIZE as u32 + 1024;

    /// Create a header for the given type and payload length.
    #[must_use]
    pub fn new(frame_type: FrameType, payload_len: u32) -> Self {
        Self { type_code: frame_type.to_u16(), payload_len }
    }

    /// Parse and validate a header from its wire bytes.
    ///
    /// Validation order: magic, version, reserved field, payload length.
    /// The type code is NOT validated here - see [`FrameType`].
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidMagic`] if the magic is not `SSYN`
    /// - [`ProtocolError::UnsupportedVersion`] if the version is not 1
    /// - [`ProtocolError::ReservedNonZero`] if the reserved field is set
    /// - [`ProtocolError::PayloadTooLarge`] if the declared length exceeds
    ///   [`Self::MAX_PAYLOAD_SIZE`]
    pub fn parse(bytes: &[u8; Self::SIZE]) -> Result<Self> {
        if bytes[0..4] != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }

        let version = u16::from_be_bytes([bytes[4], bytes[5]]);
        if version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(version));
        }

        let reserved = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
        if reserved != 0 {
            return Err(ProtocolError::ReservedNonZero(reserved));
        }

        let payload_len = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        if payload_len > Self::MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_len as usize,
                max: Self::MAX_PAYLOAD_SIZE as usize,
            });
        }

        Ok(Self { type_code: u16::from_be_bytes([bytes[6], bytes[7]]), payload_len })
    }

    /// Serialize the header to its wire bytes.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&Self::MAGIC);
        bytes[4..6].copy_from_slice(&Self::VERSION.to_be_bytes());
        bytes[6..8].copy_from_slice(&self.type_code.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.payload_len.to_be_bytes());
        bytes
    }

    /// Raw type code from the wire.
    #[must_use]
    pub fn type_code(&self) -> u16 {
        self.type_code
    }

    /// Type code as enum. `None` if unrecognized.
    #[must_use]
    pub fn frame_type(&self) -> Option<FrameType> {
        FrameType::from_u16(self.type_code)
    }

    /// Declared payload length in bytes.
    #[must_use]
    pub fn payload_len(&self) -> u32 {
        self.payload_len
    }
}

/// Complete protocol frame.
///
/// # Invariants
///
/// - `payload.len()` never exceeds [`FrameHeader::MAX_PAYLOAD_SIZE`] on the
///   wire. Construction does not enforce this (tests build oversized frames
///   on purpose); [`Frame::encode`] is the enforcement point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw type code (see [`FrameType`]).
    pub type_code: u16,
    /// Payload bytes, possibly empty.
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame with a payload.
    #[must_use]
    pub fn new(frame_type: FrameType, payload: impl Into<Bytes>) -> Self {
        Self { type_code: frame_type.to_u16(), payload: payload.into() }
    }

    /// Create a frame with an empty payload.
    #[must_use]
    pub fn empty(frame_type: FrameType) -> Self {
        Self { type_code: frame_type.to_u16(), payload: Bytes::new() }
    }

    /// Type code as enum. `None` if unrecognized.
    #[must_use]
    pub fn frame_type(&self) -> Option<FrameType> {
        FrameType::from_u16(self.type_code)
    }

    /// Header describing this frame.
    #[must_use]
    pub fn header(&self) -> FrameHeader {
        FrameHeader { type_code: self.type_code, payload_len: self.payload.len() as u32 }
    }

    /// Encode the frame into a buffer: header, then payload.
    ///
    /// The payload write is skipped entirely when the payload is empty.
    /// The caller owns flushing.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::PayloadTooLarge`] if the payload exceeds
    ///   [`FrameHeader::MAX_PAYLOAD_SIZE`]
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        if self.payload.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        dst.put_slice(&self.header().to_bytes());
        if !self.payload.is_empty() {
            dst.put_slice(&self.payload);
        }

        Ok(())
    }

    /// Decode a frame from a contiguous buffer.
    ///
    /// Used by tests and anywhere a whole frame is already in memory; the
    /// streaming path in `snapsync-transfer` parses the header first and
    /// only then reads the payload. Trailing bytes beyond the declared
    /// payload length are ignored.
    ///
    /// # Errors
    ///
    /// - Any header validation error from [`FrameHeader::parse`]
    /// - [`ProtocolError::TruncatedPayload`] if the buffer holds fewer bytes
    ///   than the header declares
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let Some(header_bytes) = bytes.get(..FrameHeader::SIZE) else {
            return Err(ProtocolError::TruncatedPayload {
                expected: FrameHeader::SIZE,
                actual: bytes.len(),
            });
        };
        let mut fixed = [0u8; FrameHeader::SIZE];
        fixed.copy_from_slice(header_bytes);
        let header = FrameHeader::parse(&fixed)?;

        let payload_len = header.payload_len() as usize;
        let Some(payload) = bytes.get(FrameHeader::SIZE..FrameHeader::SIZE + payload_len) else {
            return Err(ProtocolError::TruncatedPayload {
                expected: payload_len,
                actual: bytes.len().saturating_sub(FrameHeader::SIZE),
            });
        };

        Ok(Self { type_code: header.type_code(), payload: Bytes::copy_from_slice(payload) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trip() {
        let frame = Frame::new(FrameType::Data, &b"hello"[..]);
        let mut wire = Vec::new();
        frame.encode(&mut wire).unwrap();

        let parsed = Frame::decode(&wire).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(parsed.frame_type(), Some(FrameType::Data));
    }

    #[test]
    fn empty_payload_is_header_only() {
        let frame = Frame::empty(FrameType::Hello);
        let mut wire = Vec::new();
        frame.encode(&mut wire).unwrap();
        assert_eq!(wire.len(), FrameHeader::SIZE);
    }

    #[test]
    fn reject_invalid_magic() {
        let mut bytes = Frame::empty(FrameType::Hello).header().to_bytes();
        bytes[0..4].copy_from_slice(b"NOPE");
        assert_eq!(FrameHeader::parse(&bytes), Err(ProtocolError::InvalidMagic));
    }

    #[test]
    fn reject_invalid_version() {
        let mut bytes = Frame::empty(FrameType::Hello).header().to_bytes();
        bytes[4..6].copy_from_slice(&2u16.to_be_bytes());
        assert_eq!(FrameHeader::parse(&bytes), Err(ProtocolError::UnsupportedVersion(2)));
    }

    #[test]
    fn reject_reserved_field() {
        let mut bytes = Frame::empty(FrameType::Hello).header().to_bytes();
        bytes[15] = 1;
        assert_eq!(FrameHeader::parse(&bytes), Err(ProtocolError::ReservedNonZero(1)));
    }

    #[test]
    fn reject_oversized_payload_length() {
        let mut bytes = Frame::empty(FrameType::Data).header().to_bytes();
        let oversized = FrameHeader::MAX_PAYLOAD_SIZE + 1;
        bytes[8..12].copy_from_slice(&oversized.to_be_bytes());
        assert!(matches!(
            FrameHeader::parse(&bytes),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn unknown_type_code_passes_header_validation() {
        let mut bytes = Frame::empty(FrameType::Hello).header().to_bytes();
        bytes[6..8].copy_from_slice(&99u16.to_be_bytes());
        let header = FrameHeader::parse(&bytes).unwrap();
        assert_eq!(header.type_code(), 99);
        assert_eq!(header.frame_type(), None);
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let frame =
            Frame::new(FrameType::Data, vec![0u8; FrameHeader::MAX_PAYLOAD_SIZE as usize + 1]);
        let mut wire = Vec::new();
        assert!(matches!(frame.encode(&mut wire), Err(ProtocolError::PayloadTooLarge { .. })));
    }

    #[test]
    fn decode_rejects_truncated_payload() {
        let frame = Frame::new(FrameType::Data, vec![7u8; 100]);
        let mut wire = Vec::new();
        frame.encode(&mut wire).unwrap();
        let result = Frame::decode(&wire[..wire.len() - 1]);
        assert!(matches!(result, Err(ProtocolError::TruncatedPayload { .. })));
    }
}
