//! # Adapters
//!
//! Concrete implementations of the driven ports.
//!
//! - `InMemorySwarmDatabase` - process-local swarm cache and cursors
//! - `SystemTimeSource` - wall clock
//! - `HttpPeerPinger` - direct-delivery ping over any `HttpTransport`
//! - `StaticConfigProvider` - in-code configuration
//! - `ReqwestTransport` - HTTPS transport (requires "network" feature)
//! - `TomlConfigProvider` - config file loading (requires "network" feature)

/// Configuration providers
pub mod config;
/// HTTP transport
#[cfg(feature = "network")]
pub mod http;
/// In-memory persistence
pub mod memory;
/// Peer ping adapter
pub mod pinger;
/// Time source adapters
pub mod time;

pub use config::StaticConfigProvider;
pub use memory::InMemorySwarmDatabase;
pub use pinger::HttpPeerPinger;
pub use time::SystemTimeSource;

#[cfg(feature = "network")]
pub use config::{ConfigError, TomlConfigProvider};

#[cfg(feature = "network")]
pub use http::ReqwestTransport;

#[cfg(test)]
mod tests;
