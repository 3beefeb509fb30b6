//! SnapSync binary.
//!
//! # Usage
//!
//! ```bash
//! # Receive into a directory, advertising on the LAN
//! snapsync recv --out ~/incoming
//!
//! # Send to a literal endpoint or a discovered peer ID
//! snapsync send --to 192.168.1.55:45999 ./sample.bin
//! snapsync send --to 3f9c27a1b04e ./sample.bin
//!
//! # See who is listening
//! snapsync list
//! ```
//!
//! Log verbosity is controlled by the `SNAPSYNC_LOG` environment variable
//! (`trace`, `debug`, `info`, `warn`, `error`); logs go to stderr so they
//! never mix with progress output or NDJSON records on stdout.

use std::process::ExitCode;

use clap::Parser;
use snapsync_cli::Cli;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_env("SNAPSYNC_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // help requests are non-errors; everything else is invalid usage
            let help = matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp
                    | clap::error::ErrorKind::DisplayVersion
                    | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            );
            let _ = err.print();
            return if help { ExitCode::SUCCESS } else { ExitCode::from(2) };
        },
    };

    match snapsync_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(code = err.exit_code(), "command failed");
            eprintln!("error: {}", err.chain());
            ExitCode::from(err.exit_code() as u8)
        },
    }
}
