//! SnapSync command-line interface.
//!
//! Command parsing, discovery wiring, and output formatting around the
//! transfer and discovery crates. The binary entry point in `main.rs` only
//! sets up logging and maps the result to an exit code.

pub mod buildinfo;
pub mod cli;
pub mod commands;

pub use cli::{Cli, Command};
use snapsync_core::Result;

/// Execute a parsed command.
///
/// # Errors
///
/// Returns the command's categorized error; the caller maps it to an exit
/// code via [`snapsync_core::AppError::exit_code`].
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Version => commands::version::run(),
        Command::List { timeout, json } => commands::list::run(timeout, json).await,
        Command::Send { to, name, json, timeout, path } => {
            commands::send::run(path, to, name, json, timeout).await
        },
        Command::Recv { out, listen, overwrite, accept, json, name, no_discovery } => {
            commands::recv::run(out, listen, overwrite, accept, json, name, no_discovery).await
        },
    }
}
