//! # Driven Ports (Outbound SPI)
//!
//! These are the interfaces the swarm client **requires** the host
//! application to implement.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{PeerConfig, PeerInfo, SnodeTarget, SwarmConfig};

pub use crate::domain::NetworkError;

// ============================================================================
// HTTP
// ============================================================================

/// An outbound POST request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Full URL including scheme and port
    pub url: String,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Raw body
    pub body: Vec<u8>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpRequest {
    /// POST a JSON value.
    pub fn post_json(url: impl Into<String>, body: &Value, timeout: Duration) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            url: url.into(),
            headers,
            body: body.to_string().into_bytes(),
            timeout,
        }
    }

    /// POST raw bytes as `application/octet-stream`.
    pub fn post_bytes(url: impl Into<String>, body: Vec<u8>, timeout: Duration) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Content-Type".to_string(),
            "application/octet-stream".to_string(),
        );
        Self {
            url: url.into(),
            headers,
            body,
            timeout,
        }
    }

    /// Add or replace a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Abstract HTTP client.
///
/// Non-2xx responses are returned as `Ok`; `Err` is reserved for requests
/// that never produced a status.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute one request.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError>;
}

// ============================================================================
// PERSISTENCE
// ============================================================================

/// Key-value persistence for swarm state.
///
/// Implementations must be safe to call from many tasks at once.
pub trait SwarmDatabase: Send + Sync {
    /// Cached swarm for a recipient.
    fn swarm_cache(&self, public_key: &str) -> Option<Vec<SnodeTarget>>;

    /// Replace the cached swarm for a recipient.
    fn set_swarm_cache(&self, public_key: &str, swarm: Vec<SnodeTarget>);

    /// Retrieval cursor for a snode.
    fn last_message_hash(&self, target: &SnodeTarget) -> Option<String>;

    /// Advance the retrieval cursor for a snode.
    fn set_last_message_hash(&self, target: &SnodeTarget, hash: &str);

    /// Previously received hashes, oldest first.
    fn received_message_hashes(&self) -> Vec<String>;

    /// Replace the received-hash list.
    fn set_received_message_hashes(&self, hashes: Vec<String>);
}

// ============================================================================
// P2P
// ============================================================================

/// Sends a keep-alive ping to a contact.
#[async_trait]
pub trait PeerPinger: Send + Sync {
    /// Returns `true` when the ping was delivered directly to the peer.
    async fn ping(&self, peer: &PeerInfo) -> bool;
}

// ============================================================================
// TIME AND CONFIG
// ============================================================================

/// Abstract clock, for deterministic proof-of-work timestamps in tests.
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Abstract interface for configuration loading.
pub trait ConfigProvider: Send + Sync {
    /// Directory, transport and poller settings.
    fn swarm_config(&self) -> SwarmConfig;

    /// P2P keep-alive intervals.
    fn peer_config(&self) -> PeerConfig;
}
