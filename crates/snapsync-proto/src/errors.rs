//! Protocol error types.
//!
//! Every codec failure in this crate is a `ProtocolError`. Higher layers map
//! these onto the process-wide error taxonomy (they all count as protocol
//! violations, never as I/O or network faults).

use thiserror::Error;

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Header magic did not match `SSYN`.
    #[error("invalid protocol magic")]
    InvalidMagic,

    /// Header declared a protocol version other than 1.
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u16),

    /// Reserved header field was non-zero.
    #[error("reserved header field must be zero, got {0:#010x}")]
    ReservedNonZero(u32),

    /// Payload exceeds the frame size limit.
    #[error("payload length {size} exceeds limit {max}")]
    PayloadTooLarge {
        /// Declared or actual payload size.
        size: usize,
        /// The limit that was exceeded.
        max: usize,
    },

    /// Buffer ended before the declared payload length.
    #[error("frame payload truncated: expected {expected} bytes, got {actual}")]
    TruncatedPayload {
        /// Bytes the header declared.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// Offer name was empty or longer than 65535 bytes.
    #[error("invalid offer name length {0}")]
    NameLength(usize),

    /// Error message was empty or longer than 65535 bytes.
    #[error("invalid error message length {0}")]
    MessageLength(usize),

    /// Payload is shorter than its fixed fields require.
    #[error("payload too short: need at least {needed} bytes, got {got}")]
    PayloadTooShort {
        /// Minimum byte count for the payload shape.
        needed: usize,
        /// Bytes actually present.
        got: usize,
    },

    /// Declared inner length disagrees with the payload length.
    #[error("payload size mismatch: declared {declared} bytes, actual {actual}")]
    LengthMismatch {
        /// Total payload size implied by the inner length prefix.
        declared: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// A text field held invalid UTF-8.
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
}
