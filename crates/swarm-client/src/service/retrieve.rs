//! Message retrieval, cursor tracking and deduplication.

use std::collections::HashSet;

use serde_json::json;
use tracing::debug;

use swarm_telemetry::MESSAGES_RECEIVED;

use crate::domain::rpc::parse_messages;
use crate::domain::{Envelope, Method, RetrievedMessage, SnodeTarget, SwarmError};

use super::core::SwarmClient;
use super::retry::retry_if_needed;

impl SwarmClient {
    /// Fetch new messages for the local user from one swarm member.
    pub async fn get_messages(&self) -> Result<Vec<Envelope>, SwarmError> {
        retry_if_needed(
            self.config.max_retry_count,
            self.config.retry_backoff,
            |_| async move {
                let target = self.get_single_target_snode(&self.user_public_key).await?;
                self.retrieve_from(&target, false).await
            },
        )
        .await
    }

    /// One long-poll `retrieve` against `target`.
    pub async fn long_poll(&self, target: &SnodeTarget) -> Result<Vec<Envelope>, SwarmError> {
        self.retrieve_from(target, true).await
    }

    async fn retrieve_from(
        &self,
        target: &SnodeTarget,
        long_poll: bool,
    ) -> Result<Vec<Envelope>, SwarmError> {
        let last_hash = self.database.last_message_hash(target).unwrap_or_default();
        let params = json!({ "pubKey": self.user_public_key, "lastHash": last_hash });
        let response = self
            .invoke_with(
                Method::GetMessages,
                target,
                &self.user_public_key,
                params,
                long_poll,
            )
            .await?;
        Ok(self.process_retrieved(target, parse_messages(&response)))
    }

    /// Advance the cursor, drop already-seen messages and decode the rest.
    pub(super) fn process_retrieved(
        &self,
        target: &SnodeTarget,
        messages: Vec<RetrievedMessage>,
    ) -> Vec<Envelope> {
        if let Some(hash) = messages.last().and_then(|m| m.hash.as_deref()) {
            self.database.set_last_message_hash(target, hash);
        }
        let fresh = self.remove_duplicates(messages);
        let envelopes: Vec<Envelope> = fresh
            .into_iter()
            .filter_map(RetrievedMessage::into_envelope)
            .collect();
        if !envelopes.is_empty() {
            debug!(snode = %target, count = envelopes.len(), "Received messages");
            MESSAGES_RECEIVED.inc_by(envelopes.len() as f64);
        }
        envelopes
    }

    /// Filter against the global received-hash set and record new hashes.
    ///
    /// Serialized so two connections delivering the same message cannot
    /// both pass the check.
    fn remove_duplicates(&self, messages: Vec<RetrievedMessage>) -> Vec<RetrievedMessage> {
        let _guard = self.dedup_lock.lock();
        let mut history = self.database.received_message_hashes();
        let mut seen: HashSet<String> = history.iter().cloned().collect();

        let fresh: Vec<RetrievedMessage> = messages
            .into_iter()
            .filter(|message| match &message.hash {
                Some(hash) if seen.insert(hash.clone()) => {
                    history.push(hash.clone());
                    true
                }
                Some(_) => false,
                None => {
                    debug!("Dropping message without hash");
                    false
                }
            })
            .collect();

        let capacity = self.config.received_hash_capacity;
        if history.len() > capacity {
            history.drain(..history.len() - capacity);
        }
        self.database.set_received_message_hashes(history);
        fresh
    }
}
