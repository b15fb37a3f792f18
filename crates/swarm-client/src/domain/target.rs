//! Snode and server targets.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Path of the storage RPC endpoint on every snode.
pub const STORAGE_RPC_PATH: &str = "storage_rpc/v1";

/// Path of the snode-to-snode proxy endpoint.
pub const PROXY_PATH: &str = "proxy";

/// Path of the snode-to-server proxy endpoint.
pub const FILE_PROXY_PATH: &str = "file_proxy";

/// Keys a snode publishes alongside its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeySet {
    /// Ed25519 identity key (hex), used to address the snode through a proxy
    pub id_key: String,
    /// X25519 encryption key (hex), used for envelope key agreement
    pub encryption_key: String,
}

/// A storage node.
///
/// Identity is `(address, port)`; the key set does not take part in
/// equality or hashing, so a target parsed with or without keys refers to
/// the same failure counter and pool slot.
#[derive(Debug, Clone)]
pub struct SnodeTarget {
    /// Scheme-qualified address, e.g. `https://10.0.0.1`
    pub address: String,
    /// Storage server port
    pub port: u16,
    /// Published keys, when known
    pub public_key_set: Option<PublicKeySet>,
}

impl SnodeTarget {
    /// Create a target without published keys.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            public_key_set: None,
        }
    }

    /// Attach a published key set.
    #[must_use]
    pub fn with_keys(mut self, keys: PublicKeySet) -> Self {
        self.public_key_set = Some(keys);
        self
    }

    /// `{address}:{port}/{path}`
    pub fn url(&self, path: &str) -> String {
        format!("{}:{}/{}", self.address, self.port, path)
    }
}

impl PartialEq for SnodeTarget {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.port == other.port
    }
}

impl Eq for SnodeTarget {}

impl Hash for SnodeTarget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for SnodeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// A dedicated server reachable through a snode's file proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    /// Base URL, e.g. `https://file.example.org`
    pub base_url: String,
    /// Server X25519 encryption key (hex)
    pub encryption_key: String,
}

/// Storage RPC methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Look up the swarm responsible for a public key
    GetSwarm,
    /// Retrieve messages since a cursor hash
    GetMessages,
    /// Store a proof-of-work stamped message
    SendMessage,
}

impl Method {
    /// Method name as it appears on the wire.
    pub fn raw_name(self) -> &'static str {
        match self {
            Method::GetSwarm => "get_snodes_for_pubkey",
            Method::GetMessages => "retrieve",
            Method::SendMessage => "store",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw_name())
    }
}
