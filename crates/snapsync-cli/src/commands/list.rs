//! `list` command: browse the LAN and print the peer table.

use std::{io::Write, time::Duration, time::SystemTime};

use snapsync_core::{AppError, Result};
use snapsync_discovery as discovery;

/// Browse for peers and print them, newest first.
///
/// # Errors
///
/// - [`ErrorKind::Network`](snapsync_core::ErrorKind::Network) from the
///   browse (a quiet network is NOT an error - it prints an empty table)
/// - [`ErrorKind::Io`](snapsync_core::ErrorKind::Io) when stdout is gone
pub async fn run(timeout: Duration, json: bool) -> Result<()> {
    let peers = discovery::browse(timeout).await.map_err(|err| err.context("browse peers"))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if json {
        for peer in &peers {
            let record = serde_json::to_string(peer)
                .map_err(|err| AppError::io("encode peer record").caused_by(err))?;
            writeln!(out, "{record}")
                .map_err(|err| AppError::io("write peer record").caused_by(err))?;
        }
        return Ok(());
    }

    writeln!(out, "ID           NAME          ADDRESSES              PORT  AGE")
        .map_err(|err| AppError::io("write peer table").caused_by(err))?;
    let now = SystemTime::now();
    for peer in &peers {
        writeln!(
            out,
            "{:<12} {:<13} {:<22} {:<5} {:.1}s",
            peer.id,
            truncate(&peer.name, 13),
            truncate(&peer.addresses.join(", "), 22),
            peer.port,
            peer.age(now).as_secs_f64(),
        )
        .map_err(|err| AppError::io("write peer table").caused_by(err))?;
    }
    Ok(())
}

/// Shorten a value to `max` display characters, marking the cut with `..`.
fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max.saturating_sub(2)).collect();
    out.push_str("..");
    out
}
