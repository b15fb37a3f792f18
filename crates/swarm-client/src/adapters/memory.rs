use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::SnodeTarget;
use crate::ports::SwarmDatabase;

#[derive(Debug, Default)]
struct Tables {
    swarms: HashMap<String, Vec<SnodeTarget>>,
    last_hashes: HashMap<SnodeTarget, String>,
    received_hashes: Vec<String>,
}

/// Process-local `SwarmDatabase`.
///
/// State is lost on restart, so a restarted client re-fetches swarms and
/// may see already-delivered messages again.
#[derive(Debug, Default)]
pub struct InMemorySwarmDatabase {
    tables: RwLock<Tables>,
}

impl InMemorySwarmDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SwarmDatabase for InMemorySwarmDatabase {
    fn swarm_cache(&self, public_key: &str) -> Option<Vec<SnodeTarget>> {
        self.tables.read().swarms.get(public_key).cloned()
    }

    fn set_swarm_cache(&self, public_key: &str, swarm: Vec<SnodeTarget>) {
        self.tables
            .write()
            .swarms
            .insert(public_key.to_string(), swarm);
    }

    fn last_message_hash(&self, target: &SnodeTarget) -> Option<String> {
        self.tables.read().last_hashes.get(target).cloned()
    }

    fn set_last_message_hash(&self, target: &SnodeTarget, hash: &str) {
        self.tables
            .write()
            .last_hashes
            .insert(target.clone(), hash.to_string());
    }

    fn received_message_hashes(&self) -> Vec<String> {
        self.tables.read().received_hashes.clone()
    }

    fn set_received_message_hashes(&self, hashes: Vec<String>) {
        self.tables.write().received_hashes = hashes;
    }
}
