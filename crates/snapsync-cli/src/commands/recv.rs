//! `recv` command: receive one file, advertising on the LAN meanwhile.

use std::path::PathBuf;

use snapsync_core::{Result, identity};
use snapsync_discovery as discovery;
use snapsync_transfer::{ListeningCallback, ReceiveOptions, StopHandle, receive_once};

use crate::cli::normalize_listen_addr;

/// Run the receiver with the discovery advertiser wired through the
/// listening callback.
///
/// # Errors
///
/// Categorized per the receiver state machine. Discovery problems are never
/// among them: the beacon is advisory and degrades to a warning.
#[allow(clippy::fn_params_excessive_bools)]
pub async fn run(
    out: PathBuf,
    listen: String,
    overwrite: bool,
    accept: bool,
    json: bool,
    name: Option<String>,
    no_discovery: bool,
) -> Result<()> {
    let on_listening = if no_discovery { None } else { Some(advertise_callback(name)) };

    receive_once(ReceiveOptions {
        listen: normalize_listen_addr(&listen),
        out_dir: out,
        overwrite,
        accept_all: accept,
        json,
        prompt: Box::new(std::io::BufReader::new(std::io::stdin())),
        out: Box::new(std::io::stdout()),
        on_listening,
    })
    .await
    .map_err(|err| err.context("receive transfer failed"))
}

/// Build the listening callback that starts the beacon advertiser once the
/// receiver knows its bound port. Identity or socket failures log a warning
/// and hand back a no-op stop handle.
fn advertise_callback(instance_name: Option<String>) -> ListeningCallback {
    Box::new(move |addr| {
        let name = instance_name
            .filter(|n| !n.is_empty())
            .or_else(|| hostname::get().ok().map(|h| h.to_string_lossy().into_owned()))
            .unwrap_or_default();

        let stop: StopHandle = match identity::local_identity() {
            Ok(peer_id) => match discovery::advertise(&name, addr.port(), &peer_id) {
                Ok(advertiser) => {
                    tracing::debug!(peer_id, port = addr.port(), "advertising receiver");
                    Box::new(move || advertiser.stop())
                },
                Err(err) => {
                    tracing::warn!(error = %err.chain(), "discovery advertise failed");
                    Box::new(|| {})
                },
            },
            Err(err) => {
                tracing::warn!(error = %err.chain(), "local identity unavailable");
                Box::new(|| {})
            },
        };
        Ok(stop)
    })
}
