//! Local peer identity: derivation and persistence.
//!
//! Every host carries a short lowercase hex identifier. When the hostname
//! and primary MAC are available the ID is derived deterministically, so
//! reinstalling the tool keeps the identity stable. Otherwise a random ID is
//! generated once and persisted under the user's config directory.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};

/// Digits of the derived SHA-256 kept as the peer ID.
const ID_LEN: usize = 12;

/// Returns true when an ID matches the expected short hex format
/// (10..16 lowercase hex digits, case-insensitive on input).
#[must_use]
pub fn is_valid_peer_id(id: &str) -> bool {
    let id = id.trim();
    (10..=16).contains(&id.len())
        && id.chars().all(|c| matches!(c.to_ascii_lowercase(), '0'..='9' | 'a'..='f'))
}

/// Derive a stable short ID from hostname and MAC address.
///
/// Returns `None` when either input is blank; callers fall back to a
/// persisted random ID.
#[must_use]
pub fn deterministic_id(hostname: &str, mac: Option<&str>) -> Option<String> {
    let hostname = hostname.trim().to_lowercase();
    let mac = mac.map_or("", str::trim);
    if hostname.is_empty() || mac.is_empty() {
        return None;
    }

    let digest = Sha256::digest(format!("{hostname}|{}", mac.to_lowercase()).as_bytes());
    Some(hex::encode(digest)[..ID_LEN].to_string())
}

/// OS-appropriate path for the persisted peer ID.
///
/// `$XDG_CONFIG_HOME/snapsync/peer_id` on Unix, `%AppData%\SnapSync\peer_id`
/// on Windows.
///
/// # Errors
///
/// - [`ErrorKind::Io`](crate::ErrorKind::Io) when no config directory can
///   be resolved for the current user
pub fn local_id_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| AppError::io("resolve user config directory"))?;
    let dir_name = if cfg!(windows) { "SnapSync" } else { "snapsync" };
    Ok(base.join(dir_name).join("peer_id"))
}

/// Load a persisted peer ID from disk, trimmed.
///
/// # Errors
///
/// Propagates the underlying read error; a missing file is expected on
/// first run and handled by [`resolve_local_id`].
pub fn read_id(path: &Path) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

/// Persist a peer ID, creating parent directories as needed.
///
/// The file is written with mode 0600 on Unix and holds the ID followed by
/// a newline.
///
/// # Errors
///
/// - [`ErrorKind::Io`](crate::ErrorKind::Io) for directory creation or
///   write failures
pub fn write_id(path: &Path, id: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| AppError::io(format!("peer id path {} has no parent", path.display())))?;
    fs::create_dir_all(parent).map_err(|err| {
        AppError::io(format!("create peer id directory {}", parent.display())).caused_by(err)
    })?;

    write_private(path, format!("{id}\n").as_bytes())
        .map_err(|err| AppError::io(format!("write peer id file {}", path.display())).caused_by(err))
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::{io::Write, os::unix::fs::OpenOptionsExt};

    let mut file =
        fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
}

/// Generate a short random peer ID from the OS cryptographic RNG.
#[must_use]
pub fn random_id() -> String {
    let mut buf = [0u8; ID_LEN / 2];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Derive a deterministic peer ID or fall back to a persisted random one.
///
/// Preference order: deterministic from `(hostname, mac)`; the valid
/// content of `path`; a fresh random ID persisted to `path`.
///
/// # Errors
///
/// - [`ErrorKind::Io`](crate::ErrorKind::Io) when the fallback ID cannot
///   be persisted
pub fn resolve_local_id(hostname: &str, mac: Option<&str>, path: &Path) -> Result<String> {
    if let Some(id) = deterministic_id(hostname, mac) {
        return Ok(id);
    }

    if let Ok(stored) = read_id(path) {
        if is_valid_peer_id(&stored) {
            return Ok(stored);
        }
    }

    let random = random_id();
    write_id(path, &random).map_err(|err| err.context("persist fallback peer id"))?;
    Ok(random)
}

/// Resolve the local peer ID from this host's hostname and primary MAC.
///
/// # Errors
///
/// - [`ErrorKind::Io`](crate::ErrorKind::Io) from [`local_id_path`] or the
///   persistence fallback
pub fn local_identity() -> Result<String> {
    let host = hostname::get().map(|h| h.to_string_lossy().into_owned()).unwrap_or_default();
    let mac = mac_address::get_mac_address().ok().flatten().map(|m| m.to_string());
    let path = local_id_path()?;
    resolve_local_id(&host, mac.as_deref(), &path)
}
