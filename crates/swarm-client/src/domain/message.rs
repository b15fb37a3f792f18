//! Outgoing messages, proof-of-work stamps and retrieved envelopes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use super::config::DEFAULT_MESSAGE_TTL_MS;
use super::errors::SwarmError;
use super::target::SnodeTarget;

/// Length of a hex-encoded session public key (`05` prefix + 32 bytes).
pub const PUBLIC_KEY_HEX_LEN: usize = 66;

/// A message ready for proof of work.
///
/// Holds no timestamp or nonce; [`OutgoingMessage::stamp`] produces a
/// separate [`StampedMessage`], which is the only form a snode accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    destination: String,
    data: String,
    ttl_ms: u64,
    is_ping: bool,
}

impl OutgoingMessage {
    /// Build a message from an already serialized payload.
    ///
    /// `ttl_ms == 0` selects the default 24 hour TTL.
    pub fn new(
        destination: impl Into<String>,
        payload: &[u8],
        ttl_ms: u64,
        is_ping: bool,
    ) -> Result<Self, SwarmError> {
        let destination = destination.into();
        if destination.len() != PUBLIC_KEY_HEX_LEN
            || !destination.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(SwarmError::MessageConversionFailed(format!(
                "destination is not a {PUBLIC_KEY_HEX_LEN} character hex public key"
            )));
        }
        if payload.is_empty() {
            return Err(SwarmError::MessageConversionFailed(
                "payload is empty".to_string(),
            ));
        }
        let ttl_ms = if ttl_ms == 0 {
            DEFAULT_MESSAGE_TTL_MS
        } else {
            ttl_ms
        };

        Ok(Self {
            destination,
            data: BASE64.encode(payload),
            ttl_ms,
            is_ping,
        })
    }

    /// Recipient public key (hex).
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Base64 payload as sent on the wire.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Time to live in milliseconds.
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    /// Whether this is a P2P keep-alive ping.
    pub fn is_ping(&self) -> bool {
        self.is_ping
    }

    /// Attach a proof-of-work result, leaving `self` untouched.
    pub fn stamp(&self, timestamp_ms: u64, nonce: [u8; 8]) -> StampedMessage {
        StampedMessage {
            message: self.clone(),
            timestamp_ms,
            nonce: BASE64.encode(nonce),
        }
    }

    /// Parameters for direct peer delivery, which carries no proof of work.
    pub fn to_direct_params(&self) -> Value {
        json!({
            "pubKey": self.destination,
            "data": self.data,
            "ttl": self.ttl_ms.to_string(),
        })
    }
}

/// An outgoing message carrying its proof of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedMessage {
    message: OutgoingMessage,
    timestamp_ms: u64,
    nonce: String,
}

impl StampedMessage {
    /// The unstamped message.
    pub fn message(&self) -> &OutgoingMessage {
        &self.message
    }

    /// Timestamp the proof of work was computed against.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Base64 nonce.
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// `store` parameters; every value is a string.
    pub fn to_store_params(&self) -> Value {
        json!({
            "pubKey": self.message.destination,
            "data": self.message.data,
            "ttl": self.message.ttl_ms.to_string(),
            "timestamp": self.timestamp_ms.to_string(),
            "nonce": self.nonce,
        })
    }
}

/// A retrieved message after deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Server-assigned message hash
    pub hash: String,
    /// Decoded payload, still in the application's wire format
    pub data: Vec<u8>,
    /// Expiration in milliseconds since the epoch, when reported
    pub expiration: Option<u64>,
}

/// Result of storing a message on one target.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOutcome {
    /// Snode or peer endpoint contacted
    pub target: SnodeTarget,
    /// Parsed response body, or why this target rejected the message
    pub result: Result<Value, SwarmError>,
}

impl StoreOutcome {
    /// Whether this target accepted the message.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Phases of a send, for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendProgress {
    /// Searching for a proof-of-work nonce
    ComputingProofOfWork,
    /// Resolving the recipient's swarm
    ContactingNetwork,
    /// Storing on the target snodes or peer
    Sending,
    /// At least one target accepted the message
    Sent,
    /// Every attempt failed
    Failed,
}

/// A progress update for one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Recipient public key
    pub destination: String,
    /// Phase reached
    pub progress: SendProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination() -> String {
        format!("05{}", "ab".repeat(32))
    }

    #[test]
    fn test_new_encodes_payload() {
        let message = OutgoingMessage::new(destination(), b"hello", 1000, false).unwrap();
        assert_eq!(message.data(), "aGVsbG8=");
        assert_eq!(message.ttl_ms(), 1000);
    }

    #[test]
    fn test_zero_ttl_uses_default() {
        let message = OutgoingMessage::new(destination(), b"hello", 0, false).unwrap();
        assert_eq!(message.ttl_ms(), DEFAULT_MESSAGE_TTL_MS);
    }

    #[test]
    fn test_rejects_bad_destination() {
        let err = OutgoingMessage::new("05abc", b"hello", 0, false).unwrap_err();
        assert!(matches!(err, SwarmError::MessageConversionFailed(_)));

        let not_hex = format!("05{}", "zz".repeat(32));
        assert!(OutgoingMessage::new(not_hex, b"hello", 0, false).is_err());
    }

    #[test]
    fn test_rejects_empty_payload() {
        let err = OutgoingMessage::new(destination(), b"", 0, false).unwrap_err();
        assert!(matches!(err, SwarmError::MessageConversionFailed(_)));
    }

    #[test]
    fn test_stamp_copies() {
        let message = OutgoingMessage::new(destination(), b"hello", 1000, false).unwrap();
        let first = message.stamp(10, [0, 0, 0, 0, 0, 0, 0, 1]);
        let second = message.stamp(20, [0, 0, 0, 0, 0, 0, 0, 2]);

        assert_eq!(first.timestamp_ms(), 10);
        assert_eq!(second.timestamp_ms(), 20);
        assert_eq!(first.message(), &message);
        assert_ne!(first.nonce(), second.nonce());
    }

    #[test]
    fn test_store_params_are_strings() {
        let message = OutgoingMessage::new(destination(), b"hello", 1000, false).unwrap();
        let params = message.stamp(42, [0; 8]).to_store_params();

        assert_eq!(params["pubKey"], destination());
        assert_eq!(params["ttl"], "1000");
        assert_eq!(params["timestamp"], "42");
        assert_eq!(params["nonce"], "AAAAAAAAAAA=");
    }

    #[test]
    fn test_direct_params_carry_no_stamp() {
        let message = OutgoingMessage::new(destination(), b"hello", 1000, true).unwrap();
        let params = message.to_direct_params();
        assert!(params.get("nonce").is_none());
        assert!(params.get("timestamp").is_none());
    }
}
