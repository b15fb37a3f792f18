//! # Driving Ports (Inbound API)
//!
//! The API the swarm client exposes to the messaging layer.

use async_trait::async_trait;

use crate::domain::{Envelope, OutgoingMessage, SnodeTarget, StoreOutcome, SwarmError};

/// Callback fired when a message went out over a direct peer connection.
pub type P2pSuccessCallback = Box<dyn FnOnce() + Send>;

/// Primary swarm client API.
#[async_trait]
pub trait SwarmApi: Send + Sync {
    /// Deliver a message, directly to an online peer when possible,
    /// otherwise to the recipient's swarm.
    ///
    /// Returns one outcome per contacted target; at least one is `Ok`.
    async fn send_message(
        &self,
        message: OutgoingMessage,
        on_p2p_success: Option<P2pSuccessCallback>,
    ) -> Result<Vec<StoreOutcome>, SwarmError>;

    /// Fetch new messages for the local user from one swarm member.
    async fn get_messages(&self) -> Result<Vec<Envelope>, SwarmError>;

    /// Swarm responsible for `public_key`, refreshed when too small.
    async fn get_swarm(&self, public_key: &str) -> Result<Vec<SnodeTarget>, SwarmError>;

    /// Random subset of the swarm used for one operation.
    async fn get_target_snodes(&self, public_key: &str) -> Result<Vec<SnodeTarget>, SwarmError>;
}
