//! Domain Layer - Pure swarm logic with no I/O
//!
//! This module contains:
//! - Snode targets and RPC method names
//! - Outgoing messages, proof-of-work stamping and retrieved envelopes
//! - The proof-of-work engine
//! - Failure counting and the random snode pool
//! - Envelope encryption for proxied requests
//! - Peer records and ping interval staggering
//! - RPC response parsing

pub mod cipher;
pub mod config;
pub mod directory;
pub mod errors;
pub mod message;
pub mod peer;
pub mod pow;
pub mod rpc;
pub mod target;

pub use cipher::{EphemeralKeyPair, SharedKey};
pub use config::{PeerConfig, SwarmConfig, DEFAULT_MESSAGE_TTL_MS};
pub use directory::{FailureCounter, FailureOutcome, SnodePool};
pub use errors::{CryptoError, NetworkError, SwarmError};
pub use message::{
    Envelope, OutgoingMessage, ProgressEvent, SendProgress, StampedMessage, StoreOutcome,
};
pub use peer::{needs_ping, ping_interval, PeerInfo, PeerStatusEvent};
pub use pow::{compute_nonce, target_threshold, ProofOfWork};
pub use rpc::RetrievedMessage;
pub use target::{Method, PublicKeySet, ServerTarget, SnodeTarget};
