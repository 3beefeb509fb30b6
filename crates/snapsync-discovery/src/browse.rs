//! Bounded multicast browse.

use std::{
    collections::HashMap,
    io,
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

use snapsync_core::{AppError, Result};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::{
    net::UdpSocket,
    time::{Instant, timeout},
};

use crate::{
    beacon::{GROUP_ADDR, GROUP_PORT, decode_announcement},
    peer::Peer,
};

const DEFAULT_BROWSE_TIMEOUT: Duration = Duration::from_secs(2);
const READ_DEADLINE: Duration = Duration::from_millis(200);
const RECV_BUFFER_SIZE: usize = 64 * 1024;

/// Collect announcements for up to `window` (2 s when zero).
///
/// Repeated announcements from the same peer ID refresh the existing
/// record, so the most recent packet wins. Peers are returned sorted by
/// `last_seen`, newest first.
///
/// A bind or join failure returns an empty list without error: a
/// non-networked environment still prints an empty table, and discovery
/// failures must never mask a working direct dial.
pub async fn browse(window: Duration) -> Result<Vec<Peer>> {
    let window = if window.is_zero() { DEFAULT_BROWSE_TIMEOUT } else { window };

    let socket = match bind_browse_socket() {
        Ok(socket) => socket,
        Err(err) => {
            tracing::debug!(error = %err, "discovery browse unavailable");
            return Ok(Vec::new());
        },
    };

    let deadline = Instant::now() + window;
    let mut seen: HashMap<String, Peer> = HashMap::new();
    let mut buf = [0u8; 2048];

    while Instant::now() < deadline {
        match timeout(READ_DEADLINE, socket.recv_from(&mut buf)).await {
            Ok(Ok((n, src))) => {
                if let Some(peer) = decode_announcement(&buf[..n], src.ip()) {
                    seen.insert(peer.id.clone(), peer);
                }
            },
            // read errors and deadline expiries both just bound the loop
            Ok(Err(_)) | Err(_) => {},
        }
    }

    let mut peers: Vec<Peer> = seen.into_values().collect();
    peers.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
    Ok(peers)
}

/// Browse and return the peer whose ID matches, case-insensitively.
///
/// # Errors
///
/// - [`ErrorKind::Network`](snapsync_core::ErrorKind::Network) when no peer
///   with the given ID answered within the window
pub async fn resolve_by_id(id: &str, window: Duration) -> Result<Peer> {
    let peers = browse(window).await?;
    let needle = id.trim().to_lowercase();
    peers
        .into_iter()
        .find(|peer| peer.id == needle)
        .ok_or_else(|| AppError::network(format!("peer {id:?} not found")))
}

/// Bind the shared group port with address reuse so a browser can coexist
/// with an advertiser (and other browsers) on the same host.
fn bind_browse_socket() -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    {
        socket.set_reuse_port(true)?;
    }
    socket.set_recv_buffer_size(RECV_BUFFER_SIZE)?;
    socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, GROUP_PORT)).into())?;
    socket.join_multicast_v4(&GROUP_ADDR, &Ipv4Addr::UNSPECIFIED)?;
    socket.set_nonblocking(true)?;
    UdpSocket::from_std(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_unknown_peer_is_an_error() {
        // Nothing is advertising this ID; the browse window is kept short.
        let err = resolve_by_id("ffffffffffff", Duration::from_millis(250))
            .await
            .expect_err("unknown peer must not resolve");
        assert_eq!(err.kind(), snapsync_core::ErrorKind::Network);
    }
}
