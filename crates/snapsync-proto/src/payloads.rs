//! OFFER and ERROR payload codecs.
//!
//! Both payloads are a `u16` big-endian length prefix followed by UTF-8
//! text; the offer additionally carries a `u64` byte count. Text fields are
//! bounded at 65535 bytes and must be non-empty.

use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::{ProtocolError, Result};

const MAX_TEXT_LEN: usize = 65_535;

/// File transfer offer: the sender's declaration of name and exact size.
///
/// # Invariants
///
/// - `name` is non-empty and at most 65535 bytes of UTF-8
/// - after the offer is accepted, exactly `size` DATA payload bytes follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// Suggested destination filename. Untrusted - receivers sanitize it
    /// before any filesystem use.
    pub name: String,
    /// Exact count of payload bytes that will follow an accepted offer.
    pub size: u64,
}

impl Offer {
    /// Encode as `u16 name_len | name | u64 size`.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::NameLength`] if the name is empty or exceeds
    ///   65535 bytes
    pub fn encode(&self) -> Result<Bytes> {
        let name = self.name.as_bytes();
        if name.is_empty() || name.len() > MAX_TEXT_LEN {
            return Err(ProtocolError::NameLength(name.len()));
        }

        let mut buf = BytesMut::with_capacity(2 + name.len() + 8);
        buf.put_u16(name.len() as u16);
        buf.put_slice(name);
        buf.put_u64(self.size);
        Ok(buf.freeze())
    }

    /// Decode an offer payload.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::PayloadTooShort`] below the 10-byte minimum
    /// - [`ProtocolError::LengthMismatch`] when the declared name length
    ///   disagrees with the payload length
    /// - [`ProtocolError::NameLength`] for an empty name
    /// - [`ProtocolError::InvalidUtf8`] for a non-UTF-8 name
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < 10 {
            return Err(ProtocolError::PayloadTooShort { needed: 10, got: payload.len() });
        }

        let name_len = u16::from_be_bytes([payload[0], payload[1]]) as usize;
        if payload.len() != 2 + name_len + 8 {
            return Err(ProtocolError::LengthMismatch {
                declared: 2 + name_len + 8,
                actual: payload.len(),
            });
        }
        if name_len == 0 {
            return Err(ProtocolError::NameLength(0));
        }

        let name = std::str::from_utf8(&payload[2..2 + name_len])
            .map_err(|_| ProtocolError::InvalidUtf8("offer name"))?
            .to_owned();

        let mut size_bytes = [0u8; 8];
        size_bytes.copy_from_slice(&payload[2 + name_len..]);

        Ok(Self { name, size: u64::from_be_bytes(size_bytes) })
    }
}

/// Encode an ERROR frame message as `u16 msg_len | msg`.
///
/// # Errors
///
/// - [`ProtocolError::MessageLength`] if the message is empty or exceeds
///   65535 bytes
pub fn encode_error_message(message: &str) -> Result<Bytes> {
    let msg = message.as_bytes();
    if msg.is_empty() || msg.len() > MAX_TEXT_LEN {
        return Err(ProtocolError::MessageLength(msg.len()));
    }

    let mut buf = BytesMut::with_capacity(2 + msg.len());
    buf.put_u16(msg.len() as u16);
    buf.put_slice(msg);
    Ok(buf.freeze())
}

/// Decode an ERROR frame message payload.
///
/// # Errors
///
/// - [`ProtocolError::PayloadTooShort`] below the 2-byte minimum
/// - [`ProtocolError::LengthMismatch`] when the declared length disagrees
///   with the payload length
/// - [`ProtocolError::MessageLength`] for an empty message
/// - [`ProtocolError::InvalidUtf8`] for a non-UTF-8 message
pub fn decode_error_message(payload: &[u8]) -> Result<String> {
    if payload.len() < 2 {
        return Err(ProtocolError::PayloadTooShort { needed: 2, got: payload.len() });
    }

    let msg_len = u16::from_be_bytes([payload[0], payload[1]]) as usize;
    if payload.len() != 2 + msg_len {
        return Err(ProtocolError::LengthMismatch { declared: 2 + msg_len, actual: payload.len() });
    }
    if msg_len == 0 {
        return Err(ProtocolError::MessageLength(0));
    }

    Ok(std::str::from_utf8(&payload[2..])
        .map_err(|_| ProtocolError::InvalidUtf8("error message"))?
        .to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_round_trip() {
        let offer = Offer { name: "file.bin".to_string(), size: 42 };
        let encoded = offer.encode().unwrap();
        assert_eq!(Offer::decode(&encoded).unwrap(), offer);
    }

    #[test]
    fn offer_rejects_empty_name() {
        let offer = Offer { name: String::new(), size: 1 };
        assert_eq!(offer.encode(), Err(ProtocolError::NameLength(0)));
    }

    #[test]
    fn offer_rejects_short_payload() {
        assert!(matches!(
            Offer::decode(&[0, 1, b'a']),
            Err(ProtocolError::PayloadTooShort { .. })
        ));
    }

    #[test]
    fn offer_rejects_length_mismatch() {
        let mut encoded = Offer { name: "abc".to_string(), size: 7 }.encode().unwrap().to_vec();
        encoded[1] = 2; // claim a shorter name than present
        assert!(matches!(
            Offer::decode(&encoded),
            Err(ProtocolError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn offer_rejects_invalid_utf8() {
        let mut payload = vec![0u8, 2, 0xff, 0xfe];
        payload.extend_from_slice(&7u64.to_be_bytes());
        assert_eq!(Offer::decode(&payload), Err(ProtocolError::InvalidUtf8("offer name")));
    }

    #[test]
    fn error_message_round_trip() {
        let encoded = encode_error_message("nope").unwrap();
        assert_eq!(decode_error_message(&encoded).unwrap(), "nope");
    }

    #[test]
    fn error_message_rejects_empty() {
        assert_eq!(encode_error_message(""), Err(ProtocolError::MessageLength(0)));
        assert_eq!(decode_error_message(&[0, 0]), Err(ProtocolError::MessageLength(0)));
    }
}
