//! Test utilities for the swarm client.
//!
//! Scriptable implementations of the driven ports. Enable with the
//! `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use swarm_client::test_utils::{json_response, MockTransport};
//! use serde_json::json;
//!
//! let transport = MockTransport::new(|_request| Ok(json_response(200, &json!({}))));
//! assert!(transport.requests().is_empty());
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::domain::PeerInfo;
use crate::ports::{HttpRequest, HttpResponse, HttpTransport, NetworkError, PeerPinger, TimeSource};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, NetworkError> + Send + Sync;

/// Build a response with a JSON body.
pub fn json_response(status: u16, body: &Value) -> HttpResponse {
    HttpResponse {
        status,
        body: body.to_string().into_bytes(),
    }
}

/// Build a response with an empty body.
pub fn empty_response(status: u16) -> HttpResponse {
    HttpResponse {
        status,
        body: Vec::new(),
    }
}

/// Transport answering every request with a closure.
pub struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
    latency: Option<Duration>,
}

impl MockTransport {
    /// Answer requests with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, NetworkError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Delay every response, yielding to the runtime.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every request seen so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Requests whose URL ends with `suffix`.
    pub fn requests_to(&self, suffix: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url.ends_with(suffix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let response = (self.handler)(&request);
        self.requests.lock().push(request);
        response
    }
}

/// Pinger with scripted per-peer answers.
#[derive(Default)]
pub struct RecordingPinger {
    answers: Mutex<HashMap<String, bool>>,
    pings: Mutex<Vec<PeerInfo>>,
}

impl RecordingPinger {
    /// A pinger that answers `false` until told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the answer for a peer.
    pub fn set_reachable(&self, public_key: &str, reachable: bool) {
        self.answers.lock().insert(public_key.to_string(), reachable);
    }

    /// Every ping sent so far.
    pub fn pings(&self) -> Vec<PeerInfo> {
        self.pings.lock().clone()
    }
}

#[async_trait]
impl PeerPinger for RecordingPinger {
    async fn ping(&self, peer: &PeerInfo) -> bool {
        self.pings.lock().push(peer.clone());
        self.answers
            .lock()
            .get(&peer.public_key)
            .copied()
            .unwrap_or(false)
    }
}

/// A time source that returns a settable timestamp.
#[derive(Debug, Default)]
pub struct FixedTimeSource {
    millis: AtomicU64,
}

impl FixedTimeSource {
    /// Create a time source fixed at `millis`.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Move the clock.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}
