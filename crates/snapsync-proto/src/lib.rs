//! SnapSync wire protocol codecs.
//!
//! The transfer protocol is a sequence of length-prefixed binary frames over
//! TCP: a fixed 16-byte header followed by 0..N payload bytes. This crate
//! holds the pure codec layer - no sockets, no I/O. Reading and writing
//! frames over a connection lives in `snapsync-transfer`, which can validate
//! a header before allocating any payload memory.

pub mod errors;

mod frame;
mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::{Frame, FrameHeader, FrameType};
pub use payloads::{Offer, decode_error_message, encode_error_message};

/// Maximum DATA frame payload size (1 MiB).
///
/// Senders chunk file contents at this boundary. Receivers accept any chunk
/// sizes as long as each frame stays under [`FrameHeader::MAX_PAYLOAD_SIZE`]
/// and the cumulative total matches the offer.
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;
