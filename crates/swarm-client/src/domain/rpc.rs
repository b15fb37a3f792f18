//! Best-effort parsing of snode and seed responses.
//!
//! Malformed entries are skipped rather than failing the whole response.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Value};
use tracing::debug;

use super::message::Envelope;
use super::target::{PublicKeySet, SnodeTarget};

/// Scheme prepended to bare snode IPs.
pub const SNODE_SCHEME: &str = "https://";

/// One entry of a `retrieve` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedMessage {
    /// Message hash (cursor and dedup key)
    pub hash: Option<String>,
    /// Base64 payload
    pub data: Option<String>,
    /// Expiration in milliseconds
    pub expiration: Option<u64>,
}

impl RetrievedMessage {
    /// Decode into an envelope; `None` when hash or data is unusable.
    pub fn into_envelope(self) -> Option<Envelope> {
        let hash = self.hash?;
        let Some(data) = self.data.and_then(|d| BASE64.decode(d).ok()) else {
            debug!(hash = %hash, "Failed to decode data for message");
            return None;
        };
        Some(Envelope {
            hash,
            data,
            expiration: self.expiration,
        })
    }
}

/// Parse a `get_snodes_for_pubkey` response.
pub fn parse_swarm(response: &Value) -> Vec<SnodeTarget> {
    let Some(snodes) = response.get("snodes").and_then(Value::as_array) else {
        debug!("Failed to parse snodes from swarm response");
        return Vec::new();
    };
    snodes
        .iter()
        .filter_map(|entry| parse_snode(entry, "ip", "port"))
        .collect()
}

/// Parse a seed node `get_service_nodes` response.
pub fn parse_service_nodes(response: &Value) -> Vec<SnodeTarget> {
    let Some(states) = response
        .get("result")
        .and_then(|r| r.get("service_node_states"))
        .and_then(Value::as_array)
    else {
        debug!("Failed to parse service node states from seed response");
        return Vec::new();
    };
    states
        .iter()
        .filter_map(|entry| parse_snode(entry, "public_ip", "storage_port"))
        .collect()
}

/// Parse the `messages` array of a `retrieve` response.
pub fn parse_messages(response: &Value) -> Vec<RetrievedMessage> {
    response
        .get("messages")
        .and_then(Value::as_array)
        .map(|messages| {
            messages
                .iter()
                .map(|m| RetrievedMessage {
                    hash: m.get("hash").and_then(Value::as_str).map(str::to_string),
                    data: m.get("data").and_then(Value::as_str).map(str::to_string),
                    expiration: m.get("expiration").and_then(as_u64_lenient),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Read a `difficulty` field.
pub fn parse_difficulty(response: &Value) -> Option<u64> {
    response.get("difficulty").and_then(as_u64_lenient)
}

/// Convert header values for an encrypted descriptor: `"true"`/`"false"`
/// become booleans, integer strings become numbers.
pub fn canonical_headers<'a>(
    headers: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> Map<String, Value> {
    headers
        .into_iter()
        .map(|(name, value)| {
            let value = match value.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                other => other
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(other.to_string())),
            };
            (name.clone(), value)
        })
        .collect()
}

fn parse_snode(entry: &Value, ip_field: &str, port_field: &str) -> Option<SnodeTarget> {
    let ip = entry.get(ip_field).and_then(Value::as_str);
    let port = entry
        .get(port_field)
        .and_then(as_u64_lenient)
        .and_then(|p| u16::try_from(p).ok());
    let (Some(ip), Some(port)) = (ip, port) else {
        debug!(entry = %entry, "Failed to parse target");
        return None;
    };
    if ip.is_empty() || ip == "0.0.0.0" {
        return None;
    }

    let mut target = SnodeTarget::new(format!("{SNODE_SCHEME}{ip}"), port);
    let id_key = entry.get("pubkey_ed25519").and_then(Value::as_str);
    let encryption_key = entry.get("pubkey_x25519").and_then(Value::as_str);
    if let (Some(id_key), Some(encryption_key)) = (id_key, encryption_key) {
        target = target.with_keys(PublicKeySet {
            id_key: id_key.to_string(),
            encryption_key: encryption_key.to_string(),
        });
    }
    Some(target)
}

fn as_u64_lenient(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
