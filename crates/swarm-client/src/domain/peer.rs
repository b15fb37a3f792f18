//! P2P peer records and keep-alive scheduling rules.

use std::time::Duration;

use super::config::PeerConfig;
use super::target::SnodeTarget;

/// Last known direct address of a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    /// Contact public key (hex)
    pub public_key: String,
    /// Scheme-qualified address
    pub address: String,
    /// Port
    pub port: u16,
    /// Whether the last ping or delivery succeeded
    pub is_online: bool,
}

impl PeerInfo {
    /// The peer's storage endpoint, addressed like a snode.
    pub fn target(&self) -> SnodeTarget {
        SnodeTarget::new(self.address.clone(), self.port)
    }
}

/// Emitted whenever a peer is marked online or offline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerStatusEvent {
    /// Contact public key
    pub public_key: String,
    /// New status
    pub is_online: bool,
}

/// Keep-alive interval for a peer while online.
///
/// The side whose key sorts greater pings more often, so two peers never
/// ping each other on the same schedule.
pub fn ping_interval(our_key: &str, their_key: &str, config: &PeerConfig) -> Duration {
    if their_key < our_key {
        config.short_ping_interval
    } else {
        config.long_ping_interval
    }
}

/// Whether fresh peer info must be confirmed with a ping before the peer
/// counts as online.
pub fn needs_ping(
    previous: Option<&PeerInfo>,
    address: &str,
    port: u16,
    is_direct_message: bool,
) -> bool {
    match previous {
        None => true,
        Some(_) if !is_direct_message => true,
        Some(prev) => !prev.is_online || prev.address != address || prev.port != port,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(is_online: bool) -> PeerInfo {
        PeerInfo {
            public_key: "05bb".into(),
            address: "https://192.168.1.2".into(),
            port: 8080,
            is_online,
        }
    }

    #[test]
    fn test_intervals_are_staggered() {
        let config = PeerConfig::default();
        let a = "05aa";
        let b = "05bb";

        let a_for_b = ping_interval(a, b, &config);
        let b_for_a = ping_interval(b, a, &config);

        assert_ne!(a_for_b, b_for_a);
        assert_eq!(
            [a_for_b, b_for_a]
                .iter()
                .filter(|i| **i == config.short_ping_interval)
                .count(),
            1
        );
        assert_eq!(b_for_a, config.short_ping_interval);
    }

    #[test]
    fn test_unknown_peer_needs_ping() {
        assert!(needs_ping(None, "https://192.168.1.2", 8080, true));
    }

    #[test]
    fn test_relayed_message_needs_ping() {
        let prev = known(true);
        assert!(needs_ping(Some(&prev), "https://192.168.1.2", 8080, false));
    }

    #[test]
    fn test_offline_peer_needs_ping() {
        let prev = known(false);
        assert!(needs_ping(Some(&prev), "https://192.168.1.2", 8080, true));
    }

    #[test]
    fn test_moved_peer_needs_ping() {
        let prev = known(true);
        assert!(needs_ping(Some(&prev), "https://192.168.1.3", 8080, true));
        assert!(needs_ping(Some(&prev), "https://192.168.1.2", 9090, true));
    }

    #[test]
    fn test_stable_online_peer_skips_ping() {
        let prev = known(true);
        assert!(!needs_ping(Some(&prev), "https://192.168.1.2", 8080, true));
    }
}
