//! Message delivery: P2P fast path, then proof of work and swarm fan-out.

use futures::future::join_all;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use swarm_telemetry::{metric_inc, time_histogram, MESSAGES_STORED, POW_COMPUTATIONS, POW_DURATION};

use crate::domain::rpc::parse_difficulty;
use crate::domain::target::STORAGE_RPC_PATH;
use crate::domain::{
    compute_nonce, Method, OutgoingMessage, PeerInfo, SendProgress, StampedMessage, StoreOutcome,
    SwarmError,
};
use crate::ports::{HttpRequest, P2pSuccessCallback};

use super::core::SwarmClient;
use super::retry::retry_if_needed;

impl SwarmClient {
    /// Deliver `message`, preferring a direct connection to an online peer.
    pub async fn send_message(
        &self,
        message: OutgoingMessage,
        on_p2p_success: Option<P2pSuccessCallback>,
    ) -> Result<Vec<StoreOutcome>, SwarmError> {
        let destination = message.destination().to_string();

        if let Some(peer) = self.direct_peer(&message) {
            match self.send_direct(&peer, &message).await {
                Ok(outcome) => {
                    if let Some(callback) = on_p2p_success {
                        callback();
                    }
                    metric_inc!(MESSAGES_STORED, &["p2p"]);
                    self.emit(&destination, SendProgress::Sent);
                    return Ok(vec![outcome]);
                }
                Err(err) => {
                    if message.is_ping() {
                        warn!(peer = %destination, error = %err, "Failed to ping peer");
                    } else {
                        debug!(peer = %destination, error = %err, "Direct delivery failed; using swarm");
                    }
                }
            }
        }

        let result = retry_if_needed(
            self.config.max_retry_count,
            self.config.retry_backoff,
            |attempt| {
                if attempt > 0 {
                    debug!(recipient = %destination, attempt, "Retrying swarm send");
                }
                self.send_to_swarm_once(&message)
            },
        )
        .await;

        match &result {
            Ok(_) => self.emit(&destination, SendProgress::Sent),
            Err(err) => {
                warn!(recipient = %destination, error = %err, "Failed to send message");
                self.emit(&destination, SendProgress::Failed);
            }
        }
        result
    }

    /// The peer to try directly, if the tracker knows it and it is either
    /// online or being pinged.
    fn direct_peer(&self, message: &OutgoingMessage) -> Option<PeerInfo> {
        let tracker = self.peers.as_ref()?;
        let peer = tracker.peer(message.destination())?;
        (message.is_ping() || peer.is_online).then_some(peer)
    }

    async fn send_direct(
        &self,
        peer: &PeerInfo,
        message: &OutgoingMessage,
    ) -> Result<StoreOutcome, SwarmError> {
        let tracker = self.peers.as_ref();
        let target = peer.target();
        self.emit(message.destination(), SendProgress::Sending);

        let body = &json!({
            "method": Method::SendMessage.raw_name(),
            "params": message.to_direct_params(),
        });
        let url = &target.url(STORAGE_RPC_PATH);
        let result = retry_if_needed(
            self.config.max_retry_count,
            self.config.retry_backoff,
            |_| async move {
                let request = HttpRequest::post_json(url.as_str(), body, self.config.default_timeout);
                let response = self.transport.execute(request).await?;
                if !response.is_success() {
                    return Err(SwarmError::RequestFailed {
                        status: response.status,
                    });
                }
                Ok(response.json().unwrap_or(Value::Null))
            },
        )
        .await;

        let online = result.is_ok();
        if let Some(tracker) = tracker {
            tracker.mark(&peer.public_key, online);
        }
        result.map(|value| StoreOutcome {
            target,
            result: Ok(value),
        })
    }

    /// One attempt: stamp, resolve targets, then store on every target at
    /// once.
    async fn send_to_swarm_once(
        &self,
        message: &OutgoingMessage,
    ) -> Result<Vec<StoreOutcome>, SwarmError> {
        let destination = message.destination();
        self.emit(destination, SendProgress::ComputingProofOfWork);
        let stamped = self.stamp(message).await?;

        self.emit(destination, SendProgress::ContactingNetwork);
        let targets = self.get_target_snodes(destination).await?;
        if targets.is_empty() {
            return Err(SwarmError::DirectoryUnavailable);
        }

        self.emit(destination, SendProgress::Sending);
        let params = stamped.to_store_params();
        let outcomes: Vec<StoreOutcome> = join_all(targets.into_iter().map(|target| {
            let params = params.clone();
            async move {
                let result = self
                    .invoke(Method::SendMessage, &target, destination, params)
                    .await;
                if let Some(difficulty) = result.as_ref().ok().and_then(parse_difficulty) {
                    self.set_difficulty(difficulty);
                }
                StoreOutcome { target, result }
            }
        }))
        .await;

        if outcomes.iter().any(StoreOutcome::is_success) {
            metric_inc!(MESSAGES_STORED, &["swarm"]);
            info!(
                recipient = %destination,
                stored = outcomes.iter().filter(|o| o.is_success()).count(),
                targets = outcomes.len(),
                "Message stored"
            );
            return Ok(outcomes);
        }
        Err(outcomes
            .into_iter()
            .filter_map(|o| o.result.err())
            .last()
            .unwrap_or(SwarmError::DirectoryUnavailable))
    }

    /// Compute a fresh proof of work at the current difficulty.
    pub(super) async fn stamp(&self, message: &OutgoingMessage) -> Result<StampedMessage, SwarmError> {
        let timestamp_ms = self.time.now_millis();
        let difficulty = self.difficulty();
        let data = message.data().to_string();
        let destination = message.destination().to_string();
        let ttl_ms = message.ttl_ms();

        let nonce = tokio::task::spawn_blocking(move || {
            let _timer = time_histogram!(POW_DURATION);
            compute_nonce(&data, &destination, timestamp_ms, ttl_ms, difficulty)
        })
        .await
        .map_err(|err| SwarmError::ComputationFailed(err.to_string()))??;

        metric_inc!(POW_COMPUTATIONS);
        debug!(difficulty, timestamp_ms, "Proof of work computed");
        Ok(message.stamp(timestamp_ms, nonce))
    }
}
