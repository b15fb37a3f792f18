use crate::domain::{PeerConfig, SwarmConfig};
use crate::ports::ConfigProvider;

// ============================================================================
// StaticConfigProvider - In-code configuration
// ============================================================================

/// Static configuration provider.
///
/// Useful for tests and embedding. For deployments, use `TomlConfigProvider`.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    swarm: SwarmConfig,
    peer: PeerConfig,
}

impl StaticConfigProvider {
    /// Create with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given swarm settings.
    #[must_use]
    pub fn with_swarm_config(mut self, config: SwarmConfig) -> Self {
        self.swarm = config;
        self
    }

    /// Use the given P2P intervals.
    #[must_use]
    pub fn with_peer_config(mut self, config: PeerConfig) -> Self {
        self.peer = config;
        self
    }

    /// Use the given seed node URLs.
    #[must_use]
    pub fn with_seed_nodes(mut self, nodes: Vec<String>) -> Self {
        self.swarm.seed_nodes = nodes;
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn swarm_config(&self) -> SwarmConfig {
        self.swarm.clone()
    }

    fn peer_config(&self) -> PeerConfig {
        self.peer.clone()
    }
}

// ============================================================================
// TomlConfigProvider - File configuration (requires "network" feature)
// ============================================================================

#[cfg(feature = "network")]
mod toml_config {
    use super::*;
    use serde::Deserialize;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    #[derive(Debug, Deserialize, Default)]
    #[serde(deny_unknown_fields)]
    struct ConfigFile {
        #[serde(default)]
        swarm: SwarmSection,
        #[serde(default)]
        proof_of_work: ProofOfWorkSection,
        #[serde(default)]
        polling: PollingSection,
        #[serde(default)]
        p2p: P2pSection,
        #[serde(default)]
        seed: SeedSection,
    }

    #[derive(Debug, Deserialize, Default)]
    struct SwarmSection {
        minimum_snode_count: Option<usize>,
        target_snode_count: Option<usize>,
        failure_threshold: Option<u32>,
        max_retry_count: Option<u32>,
        retry_backoff_ms: Option<u64>,
        default_timeout_secs: Option<u64>,
        default_message_ttl_ms: Option<u64>,
        received_hash_capacity: Option<usize>,
        use_snode_proxy: Option<bool>,
        accept_invalid_certs: Option<bool>,
    }

    #[derive(Debug, Deserialize, Default)]
    struct ProofOfWorkSection {
        initial_difficulty: Option<u64>,
        max_difficulty: Option<u64>,
    }

    #[derive(Debug, Deserialize, Default)]
    struct PollingSection {
        connection_count: Option<usize>,
        retry_interval_ms: Option<u64>,
        timeout_secs: Option<u64>,
    }

    #[derive(Debug, Deserialize, Default)]
    struct P2pSection {
        short_ping_interval_secs: Option<u64>,
        long_ping_interval_secs: Option<u64>,
        offline_ping_interval_secs: Option<u64>,
    }

    #[derive(Debug, Deserialize, Default)]
    struct SeedSection {
        #[serde(default)]
        nodes: Vec<String>,
    }

    /// TOML-based configuration provider.
    ///
    /// Every key is optional; missing keys keep their defaults.
    ///
    /// # Config File Format
    ///
    /// ```toml
    /// [swarm]
    /// minimum_snode_count = 2
    /// target_snode_count = 3
    /// failure_threshold = 3
    /// max_retry_count = 2
    /// retry_backoff_ms = 1000
    /// default_timeout_secs = 20
    /// use_snode_proxy = false
    ///
    /// [proof_of_work]
    /// initial_difficulty = 1
    /// max_difficulty = 1000
    ///
    /// [polling]
    /// connection_count = 3
    /// retry_interval_ms = 4000
    /// timeout_secs = 40
    ///
    /// [p2p]
    /// short_ping_interval_secs = 60
    /// long_ping_interval_secs = 120
    /// offline_ping_interval_secs = 120
    ///
    /// [seed]
    /// nodes = ["https://storage.seed1.example:443"]
    /// ```
    #[derive(Debug, Clone)]
    pub struct TomlConfigProvider {
        swarm: SwarmConfig,
        peer: PeerConfig,
    }

    impl TomlConfigProvider {
        /// Load configuration from a TOML file.
        ///
        /// # Errors
        ///
        /// Returns error if the file cannot be read or parsed.
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
            let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
                path: path.as_ref().display().to_string(),
                error: e.to_string(),
            })?;

            Self::parse(&content)
        }

        /// Parse configuration from a TOML string.
        pub fn parse(content: &str) -> Result<Self, ConfigError> {
            let file: ConfigFile =
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

            let defaults = SwarmConfig::default();
            let s = file.swarm;
            let pow = file.proof_of_work;
            let polling = file.polling;
            let swarm = SwarmConfig {
                minimum_snode_count: s.minimum_snode_count.unwrap_or(defaults.minimum_snode_count),
                target_snode_count: s.target_snode_count.unwrap_or(defaults.target_snode_count),
                failure_threshold: s.failure_threshold.unwrap_or(defaults.failure_threshold),
                max_retry_count: s.max_retry_count.unwrap_or(defaults.max_retry_count),
                retry_backoff: s
                    .retry_backoff_ms
                    .map_or(defaults.retry_backoff, Duration::from_millis),
                default_timeout: s
                    .default_timeout_secs
                    .map_or(defaults.default_timeout, Duration::from_secs),
                long_poll_timeout: polling
                    .timeout_secs
                    .map_or(defaults.long_poll_timeout, Duration::from_secs),
                default_message_ttl_ms: s
                    .default_message_ttl_ms
                    .unwrap_or(defaults.default_message_ttl_ms),
                initial_difficulty: pow.initial_difficulty.unwrap_or(defaults.initial_difficulty),
                max_difficulty: pow.max_difficulty.unwrap_or(defaults.max_difficulty),
                long_poll_connection_count: polling
                    .connection_count
                    .unwrap_or(defaults.long_poll_connection_count),
                long_poll_retry_interval: polling
                    .retry_interval_ms
                    .map_or(defaults.long_poll_retry_interval, Duration::from_millis),
                received_hash_capacity: s
                    .received_hash_capacity
                    .unwrap_or(defaults.received_hash_capacity),
                seed_nodes: file.seed.nodes,
                use_snode_proxy: s.use_snode_proxy.unwrap_or(defaults.use_snode_proxy),
                accept_invalid_certs: s
                    .accept_invalid_certs
                    .unwrap_or(defaults.accept_invalid_certs),
            };

            let peer_defaults = PeerConfig::default();
            let p = file.p2p;
            let peer = PeerConfig {
                short_ping_interval: p
                    .short_ping_interval_secs
                    .map_or(peer_defaults.short_ping_interval, Duration::from_secs),
                long_ping_interval: p
                    .long_ping_interval_secs
                    .map_or(peer_defaults.long_ping_interval, Duration::from_secs),
                offline_ping_interval: p
                    .offline_ping_interval_secs
                    .map_or(peer_defaults.offline_ping_interval, Duration::from_secs),
            };

            Ok(Self { swarm, peer })
        }
    }

    impl ConfigProvider for TomlConfigProvider {
        fn swarm_config(&self) -> SwarmConfig {
            self.swarm.clone()
        }

        fn peer_config(&self) -> PeerConfig {
            self.peer.clone()
        }
    }

    /// Errors that can occur during config loading.
    #[derive(Debug, Clone, thiserror::Error)]
    pub enum ConfigError {
        /// File I/O error.
        #[error("failed to read config file {path}: {error}")]
        Io {
            /// Path of the file that failed to load.
            path: String,
            /// Error message from the I/O operation.
            error: String,
        },
        /// TOML parse error.
        #[error("failed to parse config: {0}")]
        Parse(String),
    }
}

#[cfg(feature = "network")]
pub use toml_config::{ConfigError, TomlConfigProvider};
