//! Build-time and runtime metadata.
//!
//! Release builds inject `SNAPSYNC_VERSION`, `SNAPSYNC_COMMIT`,
//! `SNAPSYNC_DATE`, and `SNAPSYNC_TOOLCHAIN` as compile-time environment
//! variables; anything missing falls back to development defaults.

/// Build and runtime metadata for the executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Info {
    /// Release version, `dev` when unset.
    pub version: &'static str,
    /// Source commit SHA, `unknown` when unset.
    pub commit: &'static str,
    /// Build timestamp, `unknown` when unset.
    pub date: &'static str,
    /// Toolchain string, `unknown` when unset.
    pub runtime: &'static str,
    /// Target operating system.
    pub os: &'static str,
    /// Target architecture.
    pub arch: &'static str,
}

/// Normalized metadata for this process.
#[must_use]
pub fn current() -> Info {
    Info {
        version: option_env!("SNAPSYNC_VERSION").unwrap_or("dev"),
        commit: option_env!("SNAPSYNC_COMMIT").unwrap_or("unknown"),
        date: option_env!("SNAPSYNC_DATE").unwrap_or("unknown"),
        runtime: option_env!("SNAPSYNC_TOOLCHAIN").unwrap_or("unknown"),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
    }
}

/// Render metadata in the fixed `version` output format.
#[must_use]
pub fn format_version(info: &Info) -> String {
    format!(
        "SnapSync {}\ncommit: {}\nbuilt:  {}\ngo:     {}\nos/arch:{}/{}\n",
        info.version, info.commit, info.date, info.runtime, info.os, info.arch,
    )
}
