//! Domain Errors for the Swarm Client

use thiserror::Error;

/// Errors surfaced by swarm operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwarmError {
    /// No snode could be obtained to bootstrap a swarm lookup
    #[error("no snode available to bootstrap the swarm lookup")]
    DirectoryUnavailable,

    /// Generic non-2xx response
    #[error("request failed with status code {status}")]
    RequestFailed {
        /// HTTP (or proxied logical) status code
        status: u16,
    },

    /// HTTP 421: the snode no longer serves this public key
    #[error("snode is no longer part of the recipient's swarm")]
    SnodeRelocated,

    /// HTTP 432: the attached proof of work is below the network difficulty
    #[error("insufficient proof of work")]
    InsufficientProofOfWork {
        /// Difficulty reported by the snode, when present
        difficulty: Option<u64>,
    },

    /// The proxy target has no known encryption key
    #[error("proxy target has no known encryption key")]
    TargetKeyMissing,

    /// Malformed or undecryptable proxy response
    #[error("transport error: {0}")]
    Transport(String),

    /// Connection-level failure reaching a node
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Proof of work could not be produced
    #[error("proof of work computation failed: {0}")]
    ComputationFailed(String),

    /// The outgoing message could not be built
    #[error("message conversion failed: {0}")]
    MessageConversionFailed(String),
}

impl SwarmError {
    /// Whether the bounded retry wrapper may re-attempt after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            SwarmError::ComputationFailed(_) | SwarmError::MessageConversionFailed(_)
        )
    }

    /// Whether a retry must re-stamp the message instead of backing off.
    pub fn requires_restamp(&self) -> bool {
        matches!(self, SwarmError::InsufficientProofOfWork { .. })
    }
}

impl From<CryptoError> for SwarmError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidPublicKey(_) => SwarmError::TargetKeyMissing,
            other => SwarmError::Transport(other.to_string()),
        }
    }
}

/// Errors from outbound HTTP operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// Operation timed out waiting for a response
    #[error("network operation timed out")]
    Timeout,
    /// Remote node refused or dropped the connection
    #[error("connection refused by node")]
    ConnectionRefused,
    /// The request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Any other transport failure
    #[error("request failed: {0}")]
    Failed(String),
}

impl NetworkError {
    /// Connect and timeout failures count against the contacted node.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, NetworkError::Timeout | NetworkError::ConnectionRefused)
    }
}

/// Envelope encryption errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// A peer public key is not a valid X25519 key
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    /// Ciphertext shorter than one IV
    #[error("ciphertext too short: {len} bytes")]
    CiphertextTooShort {
        /// Received length
        len: usize,
    },
    /// Padding or key mismatch
    #[error("decryption failed")]
    DecryptionFailed,
}
