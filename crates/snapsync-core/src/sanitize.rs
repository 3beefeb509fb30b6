//! Offer-name sanitization and collision-free landing paths.
//!
//! The offer name is untrusted data from the network. It must never be
//! joined to the output directory without passing through
//! [`sanitize_filename`] first.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::{AppError, Result};

const RESERVED_WINDOWS_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Produce a cross-platform safe filename from user-provided input.
///
/// Steps: keep the trailing path component (Unix or Windows separators),
/// replace `< > : " / \ | ? *`, control characters, and U+FFFD with `_`,
/// trim trailing spaces and dots, substitute `"file"` for empty results,
/// and suffix Windows reserved device stems with `_`. Idempotent.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .trim()
        .rsplit(['/', '\\'])
        .find(|component| !component.is_empty())
        .unwrap_or("file");
    let base = if base == "." { "file" } else { base };

    let cleaned: String = base
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if (c as u32) < 32 => '_',
            '\u{FFFD}' => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.trim_end_matches([' ', '.']);
    let mut result = if cleaned.is_empty() { "file".to_string() } else { cleaned.to_string() };

    // Reserved device names apply to the stem before the first dot. The
    // trailing-underscore check keeps repeated sanitization stable.
    let stem = result.split('.').next().unwrap_or_default();
    let reserved = RESERVED_WINDOWS_NAMES.iter().any(|r| stem.eq_ignore_ascii_case(r));
    if reserved && !result.ends_with('_') {
        result.push('_');
    }

    result
}

/// Compute the landing path for an offer name inside `dir`.
///
/// With `overwrite` the sanitized name is returned unconditionally.
/// Otherwise existing files get ` (1)`, ` (2)`, ... inserted before the
/// final extension until an unused path is found.
///
/// # Errors
///
/// - [`ErrorKind::Io`](crate::ErrorKind::Io) for any stat failure other
///   than not-found
pub fn resolve_collision(dir: &Path, name: &str, overwrite: bool) -> Result<PathBuf> {
    let safe = sanitize_filename(name);
    if overwrite {
        return Ok(dir.join(safe));
    }

    let (stem, ext) = match safe.rfind('.') {
        Some(dot) => safe.split_at(dot),
        None => (safe.as_str(), ""),
    };

    let candidate = dir.join(&safe);
    if !probe(&candidate)? {
        return Ok(candidate);
    }

    let mut counter: u64 = 1;
    loop {
        let next = dir.join(format!("{stem} ({counter}){ext}"));
        if !probe(&next)? {
            return Ok(next);
        }
        counter += 1;
    }
}

/// Returns whether the path exists; stat errors other than not-found are Io.
fn probe(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(AppError::io(format!("stat candidate {}", path.display())).caused_by(err)),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn replaces_windows_invalid_characters() {
        assert_eq!(sanitize_filename(r#"a<bad>:"|?*.txt"#), "a_bad______.txt");
    }

    #[test]
    fn suffixes_reserved_device_names() {
        assert_eq!(sanitize_filename("CON.txt"), "CON.txt_");
        assert_eq!(sanitize_filename("lpt3"), "lpt3_");
        assert_eq!(sanitize_filename("console.txt"), "console.txt");
    }

    #[test]
    fn strips_directory_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(r"C:\Users\x\boot.ini"), "boot.ini");
    }

    #[test]
    fn substitutes_file_for_degenerate_names() {
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("."), "file");
        assert_eq!(sanitize_filename("///"), "file");
        assert_eq!(sanitize_filename(" .. "), "file");
    }

    #[test]
    fn trims_trailing_spaces_and_dots() {
        assert_eq!(sanitize_filename("report.txt. . "), "report.txt");
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(name in ".{0,80}") {
            let once = sanitize_filename(&name);
            prop_assert_eq!(sanitize_filename(&once), once);
        }
    }

    #[test]
    fn collision_appends_counter() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("file.txt"), b"existing").unwrap();

        let path = resolve_collision(dir.path(), "file.txt", false).unwrap();
        assert_eq!(path, dir.path().join("file (1).txt"));

        fs::write(&path, b"second").unwrap();
        let path = resolve_collision(dir.path(), "file.txt", false).unwrap();
        assert_eq!(path, dir.path().join("file (2).txt"));
    }

    #[test]
    fn collision_respects_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("file.txt"), b"existing").unwrap();

        let path = resolve_collision(dir.path(), "file.txt", true).unwrap();
        assert_eq!(path, dir.path().join("file.txt"));
    }

    #[test]
    fn collision_without_existing_file_keeps_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_collision(dir.path(), "fresh.bin", false).unwrap();
        assert_eq!(path, dir.path().join("fresh.bin"));
    }
}
