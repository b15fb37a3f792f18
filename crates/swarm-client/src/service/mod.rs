//! # Swarm Client Service
//!
//! Async orchestration over the domain layer: the snode directory, the
//! encrypted proxy, message send and retrieval, the P2P tracker and the
//! long-poller.
//!
//! `SwarmClient` implements the `SwarmApi` driving port. Everything that
//! touches the network goes through the `HttpTransport` driven port, so the
//! whole layer runs against a mock in tests.

// Semantic submodules
mod api;
mod core;
mod directory;
mod p2p;
mod poller;
mod proxy;
mod retrieve;
mod retry;
mod send;

// Re-export public API
pub use self::core::{SwarmClient, LONG_POLL_HEADER};
pub use directory::SnodeDirectory;
pub use p2p::PeerTracker;
pub use poller::{LongPoller, MessageHandler};
pub use proxy::{ProxyRequest, SnodeProxy};
