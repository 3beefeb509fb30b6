//! Discovered peer records and dial-address selection.

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Serialize, Serializer};

/// A discovered SnapSync receiver.
///
/// # Invariants
///
/// - `id` is unique within a browse result; on collision the most recent
///   announcement wins
/// - `addresses` is sorted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peer {
    /// Short lowercase hex identifier.
    pub id: String,
    /// Human label from the announcement.
    pub name: String,
    /// Informational host field (the announcement's source IP).
    pub hostname: String,
    /// IPv4/IPv6 literals this peer was seen at.
    pub addresses: Vec<String>,
    /// Advertised TCP port.
    pub port: u16,
    /// When the last announcement arrived, as whole seconds since the Unix
    /// epoch in JSON output.
    #[serde(serialize_with = "serialize_last_seen")]
    pub last_seen: SystemTime,
    /// Free-form capability token, currently `direct`.
    pub features: String,
}

impl Peer {
    /// How long ago the peer was last seen.
    #[must_use]
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.last_seen).unwrap_or_default()
    }
}

fn serialize_last_seen<S: Serializer>(t: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    let secs = t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    serializer.serialize_u64(secs)
}

/// Select the address to dial for a peer.
///
/// Preference order: first RFC 1918 IPv4, then the first link-local or
/// unique-local IPv6, then the first otherwise-parseable address.
/// Unparseable strings are skipped.
#[must_use]
pub fn preferred_address(peer: &Peer) -> Option<String> {
    let mut first_ipv6 = None;
    let mut first_any = None;

    for addr in &peer.addresses {
        let Ok(ip) = addr.parse::<IpAddr>() else { continue };
        if first_any.is_none() {
            first_any = Some(addr.clone());
        }
        match ip {
            IpAddr::V4(v4) => {
                if is_rfc1918(v4) {
                    return Some(addr.clone());
                }
            },
            IpAddr::V6(v6) => {
                if first_ipv6.is_none() && is_private_ipv6(&v6) {
                    first_ipv6 = Some(addr.clone());
                }
            },
        }
    }

    first_ipv6.or(first_any)
}

fn is_rfc1918(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 10
        || (octets[0] == 172 && (16..=31).contains(&octets[1]))
        || (octets[0] == 192 && octets[1] == 168)
}

/// Link-local (fe80::/10) or unique-local (fc00::/7).
fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    (first & 0xffc0) == 0xfe80 || (first & 0xfe00) == 0xfc00
}
