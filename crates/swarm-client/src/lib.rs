//! # Swarm Client
//!
//! Client-side network core for a decentralized messaging network.
//!
//! Every user's mailbox lives on a *swarm*: a small set of storage nodes
//! (snodes) chosen by the user's public key. This crate finds those swarms,
//! stamps messages with proof of work, stores and retrieves them, relays
//! requests through encrypted single-hop proxies, long-polls for new
//! messages and delivers directly to online peers when it can.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** Pure logic (proof of work, failure counting, envelope
//!   encryption, response parsing)
//! - **Ports Layer:** `SwarmApi` (driving) and `HttpTransport`,
//!   `SwarmDatabase`, `PeerPinger`, `TimeSource`, `ConfigProvider` (driven)
//! - **Service Layer:** `SwarmClient`, `SnodeDirectory`, `SnodeProxy`,
//!   `PeerTracker`, `LongPoller`
//! - **Adapters Layer:** Concrete implementations (reqwest, TOML
//!   feature-gated)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use swarm_client::{
//!     InMemorySwarmDatabase, LongPoller, ReqwestTransport, SwarmClient, SwarmConfig,
//!     SystemTimeSource,
//! };
//!
//! let config = SwarmConfig::default();
//! let transport = Arc::new(ReqwestTransport::new(&config)?);
//! let client = Arc::new(SwarmClient::new(
//!     user_public_key,
//!     config,
//!     transport,
//!     Arc::new(InMemorySwarmDatabase::new()),
//!     Arc::new(SystemTimeSource::new()),
//! ));
//!
//! let poller = LongPoller::new(Arc::clone(&client), Arc::new(|envelopes| {
//!     for envelope in envelopes {
//!         println!("received {}", envelope.hash);
//!     }
//! }));
//! poller.start();
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod domain;
pub mod ports;
pub mod service;

/// Adapters for external integrations.
/// `ReqwestTransport` and `TomlConfigProvider` require feature: `network`
pub mod adapters;

/// Test utilities (MockTransport, RecordingPinger, FixedTimeSource)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// CORE RE-EXPORTS (Always Available)
// =============================================================================

// Domain entities
pub use domain::{
    Envelope, Method, OutgoingMessage, PeerConfig, PeerInfo, PeerStatusEvent, ProgressEvent,
    PublicKeySet, SendProgress, ServerTarget, SnodeTarget, StampedMessage, StoreOutcome,
    SwarmConfig, DEFAULT_MESSAGE_TTL_MS,
};

// Errors
pub use domain::{CryptoError, NetworkError, SwarmError};

// Domain services
pub use domain::{compute_nonce, target_threshold, ProofOfWork};

// Port traits
pub use ports::{
    ConfigProvider, HttpRequest, HttpResponse, HttpTransport, P2pSuccessCallback, PeerPinger,
    SwarmApi, SwarmDatabase, TimeSource,
};

// Service
pub use service::{
    LongPoller, MessageHandler, PeerTracker, ProxyRequest, SnodeDirectory, SnodeProxy,
    SwarmClient,
};

// =============================================================================
// ADAPTER RE-EXPORTS
// =============================================================================

pub use adapters::{HttpPeerPinger, InMemorySwarmDatabase, StaticConfigProvider, SystemTimeSource};

// Network adapters (reqwest, toml)
#[cfg(feature = "network")]
pub use adapters::{ConfigError, ReqwestTransport, TomlConfigProvider};
