//! Ports Layer - Hexagonal Architecture boundaries
//!
//! - `inbound`: Driving ports (API we expose)
//! - `outbound`: Driven ports (SPI we depend on)

pub mod inbound;
pub mod outbound;

pub use inbound::{P2pSuccessCallback, SwarmApi};
pub use outbound::{
    ConfigProvider, HttpRequest, HttpResponse, HttpTransport, NetworkError, PeerPinger,
    SwarmDatabase, TimeSource,
};
