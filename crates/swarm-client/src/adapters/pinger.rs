use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::domain::target::STORAGE_RPC_PATH;
use crate::domain::{Method, OutgoingMessage, PeerInfo, SwarmError};
use crate::ports::{HttpRequest, HttpTransport, PeerPinger};

/// Pings peers by storing a ping message on their direct endpoint.
pub struct HttpPeerPinger {
    transport: Arc<dyn HttpTransport>,
    payload: Vec<u8>,
    ttl_ms: u64,
    timeout: Duration,
}

impl HttpPeerPinger {
    /// `payload` is the application's pre-serialized ping envelope.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        payload: Vec<u8>,
        ttl_ms: u64,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            payload,
            ttl_ms,
            timeout,
        }
    }

    async fn try_ping(&self, peer: &PeerInfo) -> Result<(), SwarmError> {
        let message = OutgoingMessage::new(peer.public_key.clone(), &self.payload, self.ttl_ms, true)?;
        let body = json!({
            "method": Method::SendMessage.raw_name(),
            "params": message.to_direct_params(),
        });
        let request =
            HttpRequest::post_json(peer.target().url(STORAGE_RPC_PATH), &body, self.timeout);
        let response = self.transport.execute(request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(SwarmError::RequestFailed {
                status: response.status,
            })
        }
    }
}

#[async_trait]
impl PeerPinger for HttpPeerPinger {
    async fn ping(&self, peer: &PeerInfo) -> bool {
        match self.try_ping(peer).await {
            Ok(()) => true,
            Err(err) => {
                debug!(peer = %peer.public_key, error = %err, "Ping failed");
                false
            }
        }
    }
}
