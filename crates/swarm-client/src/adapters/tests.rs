use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::*;
use crate::domain::{PeerInfo, SnodeTarget, SwarmConfig};
use crate::ports::{ConfigProvider, PeerPinger, SwarmDatabase, TimeSource};
use crate::test_utils::{empty_response, MockTransport};

#[test]
fn test_system_time_is_after_2020() {
    assert!(SystemTimeSource::new().now_millis() > 1_577_836_800_000);
}

#[test]
fn test_memory_database_tracks_cursors_per_snode() {
    let db = InMemorySwarmDatabase::new();
    let a = SnodeTarget::new("https://10.0.0.1", 22021);
    let b = SnodeTarget::new("https://10.0.0.2", 22021);

    db.set_last_message_hash(&a, "h1");
    assert_eq!(db.last_message_hash(&a).as_deref(), Some("h1"));
    assert_eq!(db.last_message_hash(&b), None);

    db.set_swarm_cache("05aa", vec![a.clone(), b]);
    assert_eq!(db.swarm_cache("05aa").map(|s| s.len()), Some(2));
    assert_eq!(db.swarm_cache("05bb"), None);
}

#[test]
fn test_static_provider_builder() {
    let provider = StaticConfigProvider::new()
        .with_swarm_config(SwarmConfig::for_testing())
        .with_seed_nodes(vec!["https://seed.example".into()]);

    let config = provider.swarm_config();
    assert_eq!(config.retry_backoff, Duration::ZERO);
    assert_eq!(config.seed_nodes, vec!["https://seed.example".to_string()]);
    assert_eq!(provider.peer_config().short_ping_interval, Duration::from_secs(60));
}

#[cfg(feature = "network")]
mod toml_provider {
    use super::*;

    #[test]
    fn test_parse_overrides_and_defaults() {
        let provider = TomlConfigProvider::parse(
            r#"
            [swarm]
            failure_threshold = 5
            use_snode_proxy = true

            [proof_of_work]
            max_difficulty = 200

            [polling]
            connection_count = 2
            retry_interval_ms = 500

            [p2p]
            offline_ping_interval_secs = 300

            [seed]
            nodes = ["https://seed1.example:443", "https://seed2.example:443"]
            "#,
        )
        .unwrap();

        let swarm = provider.swarm_config();
        assert_eq!(swarm.failure_threshold, 5);
        assert!(swarm.use_snode_proxy);
        assert_eq!(swarm.max_difficulty, 200);
        assert_eq!(swarm.long_poll_connection_count, 2);
        assert_eq!(swarm.long_poll_retry_interval, Duration::from_millis(500));
        assert_eq!(swarm.seed_nodes.len(), 2);
        // Untouched keys keep their defaults
        assert_eq!(swarm.target_snode_count, 3);
        assert_eq!(swarm.long_poll_timeout, Duration::from_secs(40));

        let peer = provider.peer_config();
        assert_eq!(peer.offline_ping_interval, Duration::from_secs(300));
        assert_eq!(peer.short_ping_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_empty_file_is_default() {
        let provider = TomlConfigProvider::parse("").unwrap();
        assert_eq!(provider.swarm_config().minimum_snode_count, 2);
        assert!(provider.swarm_config().seed_nodes.is_empty());
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let err = TomlConfigProvider::parse("[kademlia]\nk = 20\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = TomlConfigProvider::load("/nonexistent/swarm.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

fn peer() -> PeerInfo {
    PeerInfo {
        public_key: format!("05{}", "cd".repeat(32)),
        address: "https://192.168.1.7".into(),
        port: 8080,
        is_online: false,
    }
}

#[tokio::test]
async fn test_pinger_posts_ping_to_peer_endpoint() {
    let transport = Arc::new(MockTransport::new(|_| Ok(empty_response(200))));
    let pinger = HttpPeerPinger::new(
        transport.clone(),
        b"ping".to_vec(),
        60_000,
        Duration::from_secs(5),
    );

    assert!(pinger.ping(&peer()).await);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://192.168.1.7:8080/storage_rpc/v1");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["method"], "store");
    assert_eq!(body["params"]["ttl"], "60000");
    assert_eq!(body["params"]["data"], json!("cGluZw=="));
    assert!(body["params"].get("nonce").is_none());
}

#[tokio::test]
async fn test_pinger_reports_rejection() {
    let transport = Arc::new(MockTransport::new(|_| Ok(empty_response(500))));
    let pinger = HttpPeerPinger::new(transport, b"ping".to_vec(), 60_000, Duration::from_secs(5));
    assert!(!pinger.ping(&peer()).await);
}
