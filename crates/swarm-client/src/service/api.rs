//! `SwarmApi` implementation.

use async_trait::async_trait;

use crate::domain::{Envelope, OutgoingMessage, SnodeTarget, StoreOutcome, SwarmError};
use crate::ports::{P2pSuccessCallback, SwarmApi};

use super::core::SwarmClient;

#[async_trait]
impl SwarmApi for SwarmClient {
    async fn send_message(
        &self,
        message: OutgoingMessage,
        on_p2p_success: Option<P2pSuccessCallback>,
    ) -> Result<Vec<StoreOutcome>, SwarmError> {
        SwarmClient::send_message(self, message, on_p2p_success).await
    }

    async fn get_messages(&self) -> Result<Vec<Envelope>, SwarmError> {
        SwarmClient::get_messages(self).await
    }

    async fn get_swarm(&self, public_key: &str) -> Result<Vec<SnodeTarget>, SwarmError> {
        SwarmClient::get_swarm(self, public_key).await
    }

    async fn get_target_snodes(&self, public_key: &str) -> Result<Vec<SnodeTarget>, SwarmError> {
        SwarmClient::get_target_snodes(self, public_key).await
    }
}
