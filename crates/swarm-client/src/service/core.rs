//! Core client state, RPC invocation and swarm selection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::rpc::{parse_difficulty, parse_swarm};
use crate::domain::target::STORAGE_RPC_PATH;
use crate::domain::{
    Method, ProgressEvent, SendProgress, SnodeTarget, SwarmConfig, SwarmError,
};
use crate::ports::{HttpRequest, HttpResponse, HttpTransport, SwarmDatabase, TimeSource};

use super::directory::SnodeDirectory;
use super::p2p::PeerTracker;
use super::proxy::{ProxyRequest, SnodeProxy};

/// Header asking a snode to hold the request open until messages arrive.
pub const LONG_POLL_HEADER: &str = "X-Loki-Long-Poll";

/// Capacity of the progress broadcast channel.
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Swarm client implementing the `SwarmApi` driving port.
///
/// Owns the directory, proxy transport and process-wide difficulty; share
/// it behind an `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// let client = SwarmClient::new(user_key, config, transport, database, time);
/// client.directory().seed_pool(snodes);
/// let envelopes = client.get_messages().await?;
/// ```
pub struct SwarmClient {
    pub(super) config: SwarmConfig,
    pub(super) user_public_key: String,
    pub(super) transport: Arc<dyn HttpTransport>,
    pub(super) database: Arc<dyn SwarmDatabase>,
    pub(super) time: Arc<dyn TimeSource>,
    pub(super) directory: Arc<SnodeDirectory>,
    pub(super) proxy: Arc<SnodeProxy>,
    pub(super) peers: Option<Arc<PeerTracker>>,
    pub(super) difficulty: AtomicU64,
    pub(super) dedup_lock: Mutex<()>,
    pub(super) progress_tx: broadcast::Sender<ProgressEvent>,
}

impl SwarmClient {
    /// Create a client for the local user.
    pub fn new(
        user_public_key: impl Into<String>,
        config: SwarmConfig,
        transport: Arc<dyn HttpTransport>,
        database: Arc<dyn SwarmDatabase>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let directory = Arc::new(SnodeDirectory::new(
            config.clone(),
            Arc::clone(&database),
            Arc::clone(&transport),
        ));
        let proxy = Arc::new(SnodeProxy::new(
            Arc::clone(&transport),
            Arc::clone(&directory),
        ));
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self {
            difficulty: AtomicU64::new(config.clamp_difficulty(config.initial_difficulty)),
            config,
            user_public_key: user_public_key.into(),
            transport,
            database,
            time,
            directory,
            proxy,
            peers: None,
            dedup_lock: Mutex::new(()),
            progress_tx,
        }
    }

    /// Enable the P2P fast path.
    #[must_use]
    pub fn with_peer_tracker(mut self, tracker: Arc<PeerTracker>) -> Self {
        self.peers = Some(tracker);
        self
    }

    /// Local user public key.
    pub fn user_public_key(&self) -> &str {
        &self.user_public_key
    }

    /// Active configuration.
    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Snode directory.
    pub fn directory(&self) -> &Arc<SnodeDirectory> {
        &self.directory
    }

    /// Encrypted proxy transport.
    pub fn proxy(&self) -> &Arc<SnodeProxy> {
        &self.proxy
    }

    /// P2P tracker, when enabled.
    pub fn peer_tracker(&self) -> Option<&Arc<PeerTracker>> {
        self.peers.as_ref()
    }

    /// Current proof-of-work difficulty.
    pub fn difficulty(&self) -> u64 {
        self.difficulty.load(Ordering::SeqCst)
    }

    /// Update the difficulty, clamped to the accepted range.
    pub fn set_difficulty(&self, difficulty: u64) -> u64 {
        let clamped = self.config.clamp_difficulty(difficulty);
        let previous = self.difficulty.swap(clamped, Ordering::SeqCst);
        if previous != clamped {
            info!(difficulty = clamped, "Setting proof of work difficulty");
        }
        clamped
    }

    /// Subscribe to send progress events.
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ProgressEvent> {
        self.progress_tx.subscribe()
    }

    pub(super) fn emit(&self, destination: &str, progress: SendProgress) {
        // No subscribers is fine
        let _ = self.progress_tx.send(ProgressEvent {
            destination: destination.to_string(),
            progress,
        });
    }

    // =========================================================================
    // RPC
    // =========================================================================

    /// Invoke a storage RPC on `target` on behalf of `public_key`.
    pub async fn invoke(
        &self,
        method: Method,
        target: &SnodeTarget,
        public_key: &str,
        params: Value,
    ) -> Result<Value, SwarmError> {
        self.invoke_with(method, target, public_key, params, false)
            .await
    }

    pub(super) async fn invoke_with(
        &self,
        method: Method,
        target: &SnodeTarget,
        public_key: &str,
        params: Value,
        long_poll: bool,
    ) -> Result<Value, SwarmError> {
        let body = json!({ "method": method.raw_name(), "params": params });
        let timeout = if long_poll {
            self.config.long_poll_timeout
        } else {
            self.config.default_timeout
        };
        let mut headers = BTreeMap::new();
        if long_poll {
            headers.insert(LONG_POLL_HEADER.to_string(), "true".to_string());
        }
        debug!(method = %method, snode = %target, long_poll, "Invoking");

        let response = if self.config.use_snode_proxy && target.public_key_set.is_some() {
            let mut request = ProxyRequest::post_json(STORAGE_RPC_PATH, &body, timeout);
            request.headers.extend(headers);
            self.proxy.send_to_snode(target, request).await?
        } else {
            let mut request = HttpRequest::post_json(target.url(STORAGE_RPC_PATH), &body, timeout);
            request.headers.extend(headers);
            match self.transport.execute(request).await {
                Ok(response) => response,
                Err(err) => {
                    if err.is_unreachable() {
                        self.directory.report_failure(target, Some(public_key));
                    }
                    return Err(err.into());
                }
            }
        };
        self.interpret(target, public_key, response)
    }

    /// Map a (possibly proxied) response onto the error taxonomy.
    fn interpret(
        &self,
        target: &SnodeTarget,
        public_key: &str,
        response: HttpResponse,
    ) -> Result<Value, SwarmError> {
        match response.status {
            200..=299 => {
                self.directory.report_success(target);
                if response.body.is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_slice(&response.body)
                    .map_err(|_| SwarmError::Transport("response is not JSON".to_string()))
            }
            status @ (400 | 500 | 503) => {
                self.directory.report_failure(target, Some(public_key));
                Err(SwarmError::RequestFailed { status })
            }
            421 => {
                info!(snode = %target, recipient = %public_key, "Snode moved swarm; invalidating");
                self.directory.drop_if_needed(target, public_key);
                Err(SwarmError::SnodeRelocated)
            }
            432 => {
                let difficulty = response
                    .json()
                    .as_ref()
                    .and_then(parse_difficulty)
                    .map(|d| self.set_difficulty(d));
                if difficulty.is_none() {
                    warn!(snode = %target, "Failed to update proof of work difficulty");
                }
                Err(SwarmError::InsufficientProofOfWork { difficulty })
            }
            status => {
                debug!(snode = %target, status, "Unhandled response code");
                Err(SwarmError::RequestFailed { status })
            }
        }
    }

    // =========================================================================
    // SWARM SELECTION
    // =========================================================================

    /// Swarm for `public_key`; refreshed through a random snode when the
    /// cache is below the minimum viable size.
    pub async fn get_swarm(&self, public_key: &str) -> Result<Vec<SnodeTarget>, SwarmError> {
        if let Some(swarm) = self.directory.cached_swarm(public_key) {
            return Ok(swarm);
        }

        let lock = self.directory.refresh_lock(public_key);
        let _refresh = lock.lock().await;
        // A concurrent refresh may have finished while we waited
        if let Some(swarm) = self.directory.cached_swarm(public_key) {
            return Ok(swarm);
        }

        let snode = self.directory.random_snode().await?;
        let response = self
            .invoke(
                Method::GetSwarm,
                &snode,
                public_key,
                json!({ "pubKey": public_key }),
            )
            .await?;
        let swarm = parse_swarm(&response);
        self.directory.replace_swarm(public_key, swarm.clone());
        Ok(swarm)
    }

    /// Random subset of the swarm, at most `target_snode_count` long.
    pub async fn get_target_snodes(
        &self,
        public_key: &str,
    ) -> Result<Vec<SnodeTarget>, SwarmError> {
        let mut swarm = self.get_swarm(public_key).await?;
        swarm.shuffle(&mut OsRng);
        swarm.truncate(self.config.target_snode_count);
        Ok(swarm)
    }

    /// One random swarm member.
    pub async fn get_single_target_snode(
        &self,
        public_key: &str,
    ) -> Result<SnodeTarget, SwarmError> {
        self.get_target_snodes(public_key)
            .await?
            .into_iter()
            .next()
            .ok_or(SwarmError::DirectoryUnavailable)
    }
}
