//! 1 Hz multicast announcement task.

use std::{
    net::{Ipv4Addr, SocketAddr, UdpSocket as StdUdpSocket},
    sync::Arc,
    time::Duration,
};

use snapsync_core::{AppError, Result};
use tokio::{net::UdpSocket, sync::Notify};

use crate::beacon::{GROUP_ADDR, GROUP_PORT, encode_announcement};

/// Handle to an active discovery advertisement.
///
/// Dropping the handle does NOT stop the loop; call [`Advertiser::stop`].
#[derive(Debug)]
pub struct Advertiser {
    stop: Arc<Notify>,
}

impl Advertiser {
    /// Stop the announcement loop and release its socket.
    ///
    /// Idempotent and safe to call concurrently; the stop signal fires
    /// exactly once and the task exits at its next select point.
    pub fn stop(&self) {
        self.stop.notify_one();
    }
}

/// Start announcing a receiver on the LAN multicast group.
///
/// The encoded payload is sent immediately, then once per second until
/// [`Advertiser::stop`] is called. A blank `instance_name` advertises as
/// `SnapSync`. Send failures inside the loop are ignored - the beacon is
/// advisory and must never take down a transfer.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// - [`ErrorKind::Network`](snapsync_core::ErrorKind::Network) when the
///   announcement socket cannot be created
pub fn advertise(instance_name: &str, port: u16, peer_id: &str) -> Result<Advertiser> {
    let name = instance_name.trim();
    let name = if name.is_empty() { "SnapSync" } else { name };
    let payload = encode_announcement(peer_id, name, port);

    let socket = StdUdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .map_err(|err| AppError::network("bind announce socket").caused_by(err))?;
    socket
        .set_nonblocking(true)
        .map_err(|err| AppError::network("configure announce socket").caused_by(err))?;
    let socket = UdpSocket::from_std(socket)
        .map_err(|err| AppError::network("register announce socket").caused_by(err))?;

    let stop = Arc::new(Notify::new());
    let task_stop = Arc::clone(&stop);
    tokio::spawn(async move {
        let target = SocketAddr::from((GROUP_ADDR, GROUP_PORT));
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = socket.send_to(&payload, target).await;
                },
                () = task_stop.notified() => break,
            }
        }
        tracing::debug!("discovery advertiser stopped");
    });

    Ok(Advertiser { stop })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_is_idempotent() {
        let advertiser = advertise("test", 45999, "abc123def456").expect("bind announce socket");
        advertiser.stop();
        advertiser.stop();
        // a stopped advertiser can be stopped again from another handle user
        tokio::time::sleep(Duration::from_millis(20)).await;
        advertiser.stop();
    }
}
