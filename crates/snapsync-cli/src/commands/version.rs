//! `version` command.

use std::io::Write;

use snapsync_core::{AppError, Result};

use crate::buildinfo;

/// Print build and runtime metadata to stdout.
///
/// # Errors
///
/// - [`ErrorKind::Io`](snapsync_core::ErrorKind::Io) when stdout is gone
pub fn run() -> Result<()> {
    let info = buildinfo::current();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", buildinfo::format_version(&info))
        .map_err(|err| AppError::io("write version output").caused_by(err))
}
