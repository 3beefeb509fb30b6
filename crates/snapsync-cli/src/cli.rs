//! Command-line definition and argument parsing helpers.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};

/// SnapSync is a peer-to-peer LAN file transfer tool.
#[derive(Parser, Debug)]
#[command(name = "snapsync", about = "Peer-to-peer LAN file transfer")]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print build and runtime version information.
    Version,

    /// List discovered peers on the local network.
    List {
        /// Discovery window, e.g. `2s` or `500ms`.
        #[arg(long, default_value = "2s", value_parser = parse_duration)]
        timeout: Duration,

        /// Emit NDJSON peer records instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Send a file to a receiver over TCP.
    Send {
        /// Receiver endpoint (`host:port`, `[ipv6]:port`) or a peer ID.
        #[arg(long)]
        to: String,

        /// Override the destination filename.
        #[arg(long)]
        name: Option<String>,

        /// Emit progress as NDJSON.
        #[arg(long)]
        json: bool,

        /// Peer ID resolution timeout; does not bound the dial or transfer.
        #[arg(long, default_value = "2s", value_parser = parse_duration)]
        timeout: Duration,

        /// File to send.
        path: PathBuf,
    },

    /// Receive one file over TCP.
    Recv {
        /// Output directory.
        #[arg(long)]
        out: PathBuf,

        /// Listen address (`host:port` or `:port`).
        #[arg(long, default_value = ":45999")]
        listen: String,

        /// Overwrite an existing file instead of suffixing ` (N)`.
        #[arg(long)]
        overwrite: bool,

        /// Auto-accept incoming offers.
        #[arg(long)]
        accept: bool,

        /// Emit progress as NDJSON.
        #[arg(long)]
        json: bool,

        /// Advertised instance name (defaults to the hostname).
        #[arg(long)]
        name: Option<String>,

        /// Do not advertise this receiver on the LAN.
        #[arg(long)]
        no_discovery: bool,
    },
}

/// Parse a human duration: `2s`, `500ms`, `1.5m`, or bare seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let (number, unit) = match value.find(|c: char| !(c.is_ascii_digit() || c == '.')) {
        Some(idx) => value.split_at(idx),
        None => (value, "s"),
    };

    let number: f64 = number.parse().map_err(|_| format!("invalid duration {value:?}"))?;
    let secs = match unit.trim() {
        "s" | "sec" => number,
        "ms" => number / 1000.0,
        "m" | "min" => number * 60.0,
        _ => return Err(format!("invalid duration unit in {value:?}")),
    };
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("invalid duration {value:?}"));
    }

    Ok(Duration::from_secs_f64(secs))
}

/// Expand the `:port` listen shorthand to a bindable address.
#[must_use]
pub fn normalize_listen_addr(listen: &str) -> String {
    match listen.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => listen.to_string(),
    }
}
