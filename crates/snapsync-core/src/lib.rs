//! SnapSync domain logic shared by the transfer and discovery layers.
//!
//! Everything here is independent of sockets: the process-wide error
//! taxonomy, filename sanitization and collision handling, local peer
//! identity, and transfer progress reporting.

pub mod error;
pub mod identity;
pub mod progress;
pub mod sanitize;

pub use error::{AppError, ErrorKind, Result};
