//! Swarm and peer configuration.

use std::time::Duration;

/// Default message time-to-live (24 hours).
pub const DEFAULT_MESSAGE_TTL_MS: u64 = 24 * 60 * 60 * 1000;

/// Tunables for the directory, proof of work, transport and poller.
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    /// Cached swarms smaller than this are refreshed before use
    pub minimum_snode_count: usize,
    /// Number of snodes used per operation
    pub target_snode_count: usize,
    /// Consecutive failures before a snode is evicted
    pub failure_threshold: u32,
    /// Retries after the first attempt
    pub max_retry_count: u32,
    /// Initial retry backoff (doubles per attempt)
    pub retry_backoff: Duration,
    /// Timeout for ordinary requests
    pub default_timeout: Duration,
    /// Timeout for long-poll retrieval
    pub long_poll_timeout: Duration,
    /// TTL substituted when a message is built with zero TTL
    pub default_message_ttl_ms: u64,
    /// Difficulty used until a snode reports otherwise
    pub initial_difficulty: u64,
    /// Upper bound accepted from snodes
    pub max_difficulty: u64,
    /// Concurrent long-poll connections
    pub long_poll_connection_count: usize,
    /// Pause between long-poll sessions
    pub long_poll_retry_interval: Duration,
    /// Bound on the global received-hash set
    pub received_hash_capacity: usize,
    /// Seed node URLs used to populate an empty snode pool
    pub seed_nodes: Vec<String>,
    /// Route storage RPCs through a random snode proxy
    pub use_snode_proxy: bool,
    /// Snodes present self-signed certificates
    pub accept_invalid_certs: bool,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            minimum_snode_count: 2,
            target_snode_count: 3,
            failure_threshold: 3,
            max_retry_count: 2,
            retry_backoff: Duration::from_secs(1),
            default_timeout: Duration::from_secs(20),
            long_poll_timeout: Duration::from_secs(40),
            default_message_ttl_ms: DEFAULT_MESSAGE_TTL_MS,
            initial_difficulty: 1,
            max_difficulty: 1000,
            long_poll_connection_count: 3,
            long_poll_retry_interval: Duration::from_secs(4),
            received_hash_capacity: 10_000,
            seed_nodes: Vec::new(),
            use_snode_proxy: false,
            accept_invalid_certs: true,
        }
    }
}

impl SwarmConfig {
    /// Fast config for tests: no backoff, short poll interval.
    pub fn for_testing() -> Self {
        Self {
            retry_backoff: Duration::ZERO,
            long_poll_retry_interval: Duration::from_millis(10),
            default_timeout: Duration::from_secs(1),
            long_poll_timeout: Duration::from_secs(1),
            ..Self::default()
        }
    }

    /// Clamp a snode-reported difficulty into the accepted range.
    pub fn clamp_difficulty(&self, difficulty: u64) -> u64 {
        difficulty.clamp(1, self.max_difficulty.max(1))
    }
}

/// P2P keep-alive intervals.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Interval used by the peer with the greater public key
    pub short_ping_interval: Duration,
    /// Interval used by the peer with the smaller public key
    pub long_ping_interval: Duration,
    /// Interval while a peer is offline
    pub offline_ping_interval: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            short_ping_interval: Duration::from_secs(60),
            long_ping_interval: Duration::from_secs(120),
            offline_ping_interval: Duration::from_secs(120),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SwarmConfig::default();
        assert_eq!(config.minimum_snode_count, 2);
        assert_eq!(config.target_snode_count, 3);
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.max_retry_count, 2);
        assert_eq!(config.long_poll_connection_count, 3);
        assert_eq!(config.default_message_ttl_ms, 86_400_000);
    }

    #[test]
    fn test_clamp_difficulty() {
        let config = SwarmConfig::default();
        assert_eq!(config.clamp_difficulty(0), 1);
        assert_eq!(config.clamp_difficulty(50), 50);
        assert_eq!(config.clamp_difficulty(u64::MAX), 1000);
    }
}
