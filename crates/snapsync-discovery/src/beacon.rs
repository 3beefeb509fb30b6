//! Announcement packet codec.
//!
//! One UDP packet per announcement: a fixed prefix followed by
//! `key=value` pairs separated by semicolons. The `SSYNMDNS1|` prefix and
//! `ver=1` are mandatory filters on decode; packets failing either are
//! silently ignored, as is anything else malformed - the group is shared
//! with whatever happens to multicast on the same port.

use std::{collections::HashMap, net::IpAddr, net::Ipv4Addr, time::SystemTime};

use snapsync_core::identity::is_valid_peer_id;

use crate::peer::Peer;

/// DNS-SD style service type carried in announcements.
pub const SERVICE_TYPE: &str = "_snapsync._tcp";

/// DNS-SD style domain carried in announcements.
pub const SERVICE_DOMAIN: &str = "local.";

/// Multicast group shared by announce and browse.
pub const GROUP_ADDR: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// UDP port of the multicast group.
pub const GROUP_PORT: u16 = 53535;

const PACKET_PREFIX: &str = "SSYNMDNS1|";

/// Encode an announcement packet body.
///
/// Semicolons inside the name would corrupt the field list and are
/// stripped.
pub(crate) fn encode_announcement(id: &str, name: &str, port: u16) -> Vec<u8> {
    let name = name.replace(';', "");
    format!(
        "{PACKET_PREFIX}ver=1;type={SERVICE_TYPE};domain={SERVICE_DOMAIN};\
         id={id};name={name};features=direct;port={port}"
    )
    .into_bytes()
}

/// Decode an announcement packet into a peer record.
///
/// Returns `None` for anything that is not a valid SnapSync announcement.
/// The source IP becomes the peer's sole address and its hostname field,
/// and the fallback display name.
pub(crate) fn decode_announcement(payload: &[u8], src: IpAddr) -> Option<Peer> {
    let text = std::str::from_utf8(payload).ok()?;
    let body = text.strip_prefix(PACKET_PREFIX)?;

    let mut fields: HashMap<&str, &str> = HashMap::new();
    for part in body.split(';') {
        if let Some((key, value)) = part.split_once('=') {
            fields.insert(key.trim(), value.trim());
        }
    }

    if fields.get("ver") != Some(&"1") || fields.get("type") != Some(&SERVICE_TYPE) {
        return None;
    }

    let port: u16 = fields.get("port")?.parse().ok()?;
    if port == 0 {
        return None;
    }

    let id = fields.get("id")?.to_lowercase();
    if !is_valid_peer_id(&id) {
        return None;
    }

    let source = src.to_string();
    let name = match fields.get("name") {
        Some(name) if !name.is_empty() => (*name).to_string(),
        _ => source.clone(),
    };

    Some(Peer {
        id,
        name,
        hostname: source.clone(),
        addresses: vec![source],
        port,
        last_seen: SystemTime::now(),
        features: fields.get("features").copied().unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10));

    #[test]
    fn announcement_round_trip() {
        let packet = encode_announcement("abc123def456", "LivingRoomPC", 45999);
        let peer = decode_announcement(&packet, SRC).unwrap();

        assert_eq!(peer.id, "abc123def456");
        assert_eq!(peer.name, "LivingRoomPC");
        assert_eq!(peer.port, 45999);
        assert_eq!(peer.features, "direct");
        assert_eq!(peer.addresses, vec!["192.168.1.10".to_string()]);
        assert_eq!(peer.hostname, "192.168.1.10");
    }

    #[test]
    fn encode_strips_semicolons_from_name() {
        let packet = encode_announcement("abc123def456", "evil;port=1", 45999);
        let peer = decode_announcement(&packet, SRC).unwrap();
        assert_eq!(peer.name, "evilport=1");
        assert_eq!(peer.port, 45999);
    }

    #[test]
    fn blank_name_falls_back_to_source_ip() {
        let packet = b"SSYNMDNS1|ver=1;type=_snapsync._tcp;id=abc123def456;name=;port=45999";
        let peer = decode_announcement(packet, SRC).unwrap();
        assert_eq!(peer.name, "192.168.1.10");
    }

    #[test]
    fn rejects_foreign_packets() {
        assert!(decode_announcement(b"HELLO|ver=1", SRC).is_none());
        assert!(decode_announcement(b"", SRC).is_none());
        assert!(decode_announcement(&[0xff, 0xfe, 0x00], SRC).is_none());
    }

    #[test]
    fn rejects_wrong_version_or_type() {
        let wrong_ver = b"SSYNMDNS1|ver=2;type=_snapsync._tcp;id=abc123def456;port=45999";
        assert!(decode_announcement(wrong_ver, SRC).is_none());

        let wrong_type = b"SSYNMDNS1|ver=1;type=_other._udp;id=abc123def456;port=45999";
        assert!(decode_announcement(wrong_type, SRC).is_none());
    }

    #[test]
    fn rejects_bad_port_or_id() {
        let no_port = b"SSYNMDNS1|ver=1;type=_snapsync._tcp;id=abc123def456";
        assert!(decode_announcement(no_port, SRC).is_none());

        let zero_port = b"SSYNMDNS1|ver=1;type=_snapsync._tcp;id=abc123def456;port=0";
        assert!(decode_announcement(zero_port, SRC).is_none());

        let bad_id = b"SSYNMDNS1|ver=1;type=_snapsync._tcp;id=xyz;port=45999";
        assert!(decode_announcement(bad_id, SRC).is_none());
    }

    #[test]
    fn uppercase_id_is_normalized() {
        let packet = b"SSYNMDNS1|ver=1;type=_snapsync._tcp;id=ABC123DEF456;port=45999";
        let peer = decode_announcement(packet, SRC).unwrap();
        assert_eq!(peer.id, "abc123def456");
    }
}
