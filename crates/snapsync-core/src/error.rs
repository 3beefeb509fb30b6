//! Process-wide error taxonomy.
//!
//! Every failure is tagged with exactly one [`ErrorKind`] so the process
//! exit code is deterministic. Layers add context by wrapping: the inner
//! error becomes the `source` and keeps the original kind, so the tag chosen
//! at the failure site survives to the CLI boundary.

use std::fmt;

use snapsync_proto::ProtocolError;

/// Convenience alias for fallible operations in this workspace.
pub type Result<T> = std::result::Result<T, AppError>;

type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure categories driving user-visible behavior and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid CLI usage (exit code 2).
    Usage,
    /// The peer declined the transfer (exit code 3).
    Rejected,
    /// Malformed or out-of-order wire data (exit code 4).
    InvalidProtocol,
    /// Socket-level failure: dial, read, write, resolve (exit code 5).
    Network,
    /// Local filesystem failure (exit code 6).
    Io,
}

/// A categorized error with an optional cause chain.
#[derive(Debug)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    source: Option<Source>,
}

impl AppError {
    /// Create an error with an explicit kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), source: None }
    }

    /// Invalid CLI usage.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, message)
    }

    /// The peer declined the transfer.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Rejected, message)
    }

    /// Malformed or out-of-order wire data.
    pub fn invalid_protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidProtocol, message)
    }

    /// Socket-level failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// Local filesystem failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn caused_by(mut self, source: impl Into<Source>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Wrap this error under a new context message, keeping its kind.
    ///
    /// The original error becomes the source, so rendering the chain yields
    /// `context: original: cause`.
    #[must_use]
    pub fn context(self, message: impl Into<String>) -> Self {
        Self { kind: self.kind, message: message.into(), source: Some(Box::new(self)) }
    }

    /// The failure category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::Usage => 2,
            ErrorKind::Rejected => 3,
            ErrorKind::InvalidProtocol => 4,
            ErrorKind::Network => 5,
            ErrorKind::Io => 6,
        }
    }

    /// Render the full `message: cause: cause` chain for display.
    #[must_use]
    pub fn chain(&self) -> String {
        let mut out = self.message.clone();
        let mut source = self.source.as_deref().map(|s| s as &(dyn std::error::Error));
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|s| s as &(dyn std::error::Error + 'static))
    }
}

/// Codec failures are always protocol violations.
impl From<ProtocolError> for AppError {
    fn from(err: ProtocolError) -> Self {
        Self::new(ErrorKind::InvalidProtocol, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(AppError::usage("u").exit_code(), 2);
        assert_eq!(AppError::rejected("r").exit_code(), 3);
        assert_eq!(AppError::invalid_protocol("p").exit_code(), 4);
        assert_eq!(AppError::network("n").exit_code(), 5);
        assert_eq!(AppError::io("i").exit_code(), 6);
    }

    #[test]
    fn context_preserves_kind_and_chain() {
        let inner = AppError::network("dial 10.0.0.1:45999")
            .caused_by(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"));
        let wrapped = inner.context("send transfer failed");

        assert_eq!(wrapped.kind(), ErrorKind::Network);
        assert_eq!(wrapped.chain(), "send transfer failed: dial 10.0.0.1:45999: refused");
    }

    #[test]
    fn protocol_errors_map_to_invalid_protocol() {
        let err: AppError = ProtocolError::InvalidMagic.into();
        assert_eq!(err.kind(), ErrorKind::InvalidProtocol);
        assert_eq!(err.exit_code(), 4);
    }
}
