//! `send` command: resolve the target, then stream the file.

use std::{path::PathBuf, time::Duration};

use snapsync_core::{AppError, Result, identity};
use snapsync_discovery as discovery;
use snapsync_transfer::{SendOptions, send_file};

/// Resolve `--to` and run the sender.
///
/// # Errors
///
/// Categorized per the sender state machine; additionally
/// [`ErrorKind::Usage`](snapsync_core::ErrorKind::Usage) when `--to` is
/// neither an endpoint nor a peer ID, and
/// [`ErrorKind::Network`](snapsync_core::ErrorKind::Network) when a peer ID
/// cannot be resolved within the timeout.
pub async fn run(
    path: PathBuf,
    to: String,
    name: Option<String>,
    json: bool,
    timeout: Duration,
) -> Result<()> {
    let target = resolve_target(&to, timeout).await?;
    send_file(SendOptions { path, to: target, name, json, out: Box::new(std::io::stdout()) })
        .await
        .map_err(|err| err.context("send transfer failed"))
}

/// Turn `--to` into a dialable endpoint.
///
/// Anything containing a colon (`host:port`, `[ipv6]:port`) is used
/// verbatim; everything else must be a peer ID, resolved via discovery to
/// its preferred address and advertised port. The timeout governs only this
/// resolution, never the dial or transfer.
async fn resolve_target(to: &str, timeout: Duration) -> Result<String> {
    if to.contains(':') {
        return Ok(to.to_string());
    }
    if !identity::is_valid_peer_id(to) {
        return Err(AppError::usage(format!("--to must be host:port or a peer id, got {to:?}")));
    }

    let peer = discovery::resolve_by_id(to, timeout)
        .await
        .map_err(|err| err.context(format!("resolve peer {to:?}")))?;
    let address = discovery::preferred_address(&peer)
        .ok_or_else(|| AppError::network(format!("peer {to:?} advertised no usable address")))?;
    tracing::debug!(peer = %peer.id, address, port = peer.port, "peer resolved");

    Ok(endpoint(&address, peer.port))
}

/// Format a dial endpoint, bracketing IPv6 literals.
fn endpoint(address: &str, port: u16) -> String {
    if address.contains(':') {
        format!("[{address}]:{port}")
    } else {
        format!("{address}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use snapsync_core::ErrorKind;

    use super::*;

    #[test]
    fn endpoints_bracket_ipv6() {
        assert_eq!(endpoint("192.168.1.55", 45999), "192.168.1.55:45999");
        assert_eq!(endpoint("fe80::1", 45999), "[fe80::1]:45999");
    }

    #[tokio::test]
    async fn literal_endpoints_pass_through() {
        let target = resolve_target("127.0.0.1:45999", Duration::from_secs(2)).await.unwrap();
        assert_eq!(target, "127.0.0.1:45999");

        let target = resolve_target("[::1]:45999", Duration::from_secs(2)).await.unwrap();
        assert_eq!(target, "[::1]:45999");
    }

    #[tokio::test]
    async fn garbage_target_is_a_usage_error() {
        let err = resolve_target("not-a-peer", Duration::from_millis(50)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
