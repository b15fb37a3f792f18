//! # Snode Directory
//!
//! Owns the swarm cache (through [`SwarmDatabase`]), the random snode pool
//! and the failure counters. All three are shared process-wide, so every
//! mutation goes through here.
//!
//! ## Lock order
//!
//! `failures` → `cache_lock` → `pool`. Eviction holds the failure lock for
//! the whole remove-then-reset, so no caller can observe a node that is
//! gone from the cache but still counted, or the reverse.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use serde_json::json;
use tracing::{debug, info, warn};

use swarm_telemetry::{metric_inc, SNODES_EVICTED, SNODE_FAILURES, SNODE_POOL_SIZE};

use crate::domain::rpc::parse_service_nodes;
use crate::domain::{
    FailureCounter, FailureOutcome, SnodePool, SnodeTarget, SwarmConfig, SwarmError,
};
use crate::ports::{HttpRequest, HttpTransport, SwarmDatabase};

/// Path of the seed node JSON-RPC endpoint.
const SEED_RPC_PATH: &str = "json_rpc";

/// Shared snode state with failure-driven eviction.
pub struct SnodeDirectory {
    config: SwarmConfig,
    database: Arc<dyn SwarmDatabase>,
    transport: Arc<dyn HttpTransport>,
    pool: RwLock<SnodePool>,
    failures: Mutex<FailureCounter>,
    cache_lock: Mutex<()>,
    refresh_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    bootstrap_lock: tokio::sync::Mutex<()>,
}

impl SnodeDirectory {
    /// Create a directory with an empty pool.
    pub fn new(
        config: SwarmConfig,
        database: Arc<dyn SwarmDatabase>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            failures: Mutex::new(FailureCounter::new(config.failure_threshold)),
            config,
            database,
            transport,
            pool: RwLock::new(SnodePool::new()),
            cache_lock: Mutex::new(()),
            refresh_locks: Mutex::new(HashMap::new()),
            bootstrap_lock: tokio::sync::Mutex::new(()),
        }
    }

    // =========================================================================
    // SWARM CACHE
    // =========================================================================

    /// Cached swarm, only when it meets the minimum viable size.
    pub fn cached_swarm(&self, public_key: &str) -> Option<Vec<SnodeTarget>> {
        let _guard = self.cache_lock.lock();
        self.database
            .swarm_cache(public_key)
            .filter(|swarm| swarm.len() >= self.config.minimum_snode_count)
    }

    /// Raw cached swarm regardless of size.
    pub fn swarm_snapshot(&self, public_key: &str) -> Vec<SnodeTarget> {
        let _guard = self.cache_lock.lock();
        self.database.swarm_cache(public_key).unwrap_or_default()
    }

    /// Replace the cached swarm after a refresh.
    pub fn replace_swarm(&self, public_key: &str, swarm: Vec<SnodeTarget>) {
        let _guard = self.cache_lock.lock();
        debug!(recipient = %public_key, count = swarm.len(), "Caching swarm");
        self.database.set_swarm_cache(public_key, swarm);
    }

    /// Per-recipient lock serializing refreshes.
    pub fn refresh_lock(&self, public_key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.refresh_locks
            .lock()
            .entry(public_key.to_string())
            .or_default()
            .clone()
    }

    /// Remove `target` from the cached swarm of `public_key`, if present.
    pub fn drop_if_needed(&self, target: &SnodeTarget, public_key: &str) {
        let _guard = self.cache_lock.lock();
        self.drop_from_cache_locked(target, public_key);
    }

    fn drop_from_cache_locked(&self, target: &SnodeTarget, public_key: &str) {
        let Some(mut swarm) = self.database.swarm_cache(public_key) else {
            return;
        };
        let before = swarm.len();
        swarm.retain(|snode| snode != target);
        if swarm.len() != before {
            info!(snode = %target, recipient = %public_key, "Dropping snode from swarm cache");
            self.database.set_swarm_cache(public_key, swarm);
        }
    }

    // =========================================================================
    // FAILURE ACCOUNTING
    // =========================================================================

    /// Count a failure; evict at the threshold.
    ///
    /// Without a recipient only the pool is pruned. Returns `true` when the
    /// node was evicted.
    pub fn report_failure(&self, target: &SnodeTarget, public_key: Option<&str>) -> bool {
        metric_inc!(SNODE_FAILURES);
        let mut failures = self.failures.lock();
        match failures.record_failure(target) {
            FailureOutcome::Counted(count) => {
                debug!(snode = %target, count, "Couldn't reach snode");
                false
            }
            FailureOutcome::ThresholdReached => {
                warn!(snode = %target, "Failure threshold reached; dropping snode");
                if let Some(public_key) = public_key {
                    let _guard = self.cache_lock.lock();
                    self.drop_from_cache_locked(target, public_key);
                }
                self.remove_from_pool(target);
                failures.reset(target);
                metric_inc!(SNODES_EVICTED);
                true
            }
        }
    }

    /// Reset the failure count after a successful call.
    pub fn report_success(&self, target: &SnodeTarget) {
        self.failures.lock().reset(target);
    }

    /// Current consecutive-failure count.
    pub fn failure_count(&self, target: &SnodeTarget) -> u32 {
        self.failures.lock().count(target)
    }

    // =========================================================================
    // RANDOM POOL
    // =========================================================================

    /// Replace the pool contents.
    pub fn seed_pool(&self, snodes: Vec<SnodeTarget>) {
        let mut pool = self.pool.write();
        pool.replace(snodes);
        SNODE_POOL_SIZE.set(pool.len() as f64);
    }

    /// Remove a snode from the pool; returns whether it was present.
    pub fn remove_from_pool(&self, target: &SnodeTarget) -> bool {
        let mut pool = self.pool.write();
        let removed = pool.remove(target);
        SNODE_POOL_SIZE.set(pool.len() as f64);
        removed
    }

    /// Whether `target` is pooled.
    pub fn pool_contains(&self, target: &SnodeTarget) -> bool {
        self.pool.read().contains(target)
    }

    /// Number of pooled snodes.
    pub fn pool_size(&self) -> usize {
        self.pool.read().len()
    }

    /// A random pooled snode, bootstrapping from seeds when the pool is empty.
    pub async fn random_snode(&self) -> Result<SnodeTarget, SwarmError> {
        self.random_snode_excluding(None).await
    }

    /// Like [`random_snode`](Self::random_snode), never returning `exclude`.
    pub async fn random_snode_excluding(
        &self,
        exclude: Option<&SnodeTarget>,
    ) -> Result<SnodeTarget, SwarmError> {
        let picked = self.pool.read().choose(&mut OsRng, exclude);
        if let Some(snode) = picked {
            return Ok(snode);
        }
        self.bootstrap_from_seeds().await?;
        self.pool
            .read()
            .choose(&mut OsRng, exclude)
            .ok_or(SwarmError::DirectoryUnavailable)
    }

    async fn bootstrap_from_seeds(&self) -> Result<(), SwarmError> {
        let _guard = self.bootstrap_lock.lock().await;
        if !self.pool.read().is_empty() {
            return Ok(());
        }

        let mut seeds = self.config.seed_nodes.clone();
        seeds.shuffle(&mut OsRng);
        for seed in seeds {
            let url = format!("{}/{}", seed.trim_end_matches('/'), SEED_RPC_PATH);
            debug!(seed = %seed, "Populating snode pool from seed");
            let request = HttpRequest::post_json(
                url,
                &json!({ "method": "get_service_nodes" }),
                self.config.default_timeout,
            );
            let snodes = match self.transport.execute(request).await {
                Ok(response) if response.is_success() => response
                    .json()
                    .map(|body| parse_service_nodes(&body))
                    .unwrap_or_default(),
                Ok(response) => {
                    warn!(seed = %seed, status = response.status, "Seed node rejected request");
                    continue;
                }
                Err(err) => {
                    warn!(seed = %seed, error = %err, "Seed node unreachable");
                    continue;
                }
            };
            if snodes.is_empty() {
                warn!(seed = %seed, "Seed node returned no usable snodes");
                continue;
            }
            info!(count = snodes.len(), "Snode pool populated");
            self.seed_pool(snodes);
            return Ok(());
        }
        Err(SwarmError::DirectoryUnavailable)
    }
}
