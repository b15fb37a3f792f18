//! Shared random snode pool.

use std::collections::HashSet;

use rand::seq::IteratorRandom;
use rand::Rng;

use crate::domain::SnodeTarget;

/// Snodes usable as bootstrap lookups and proxy intermediaries.
#[derive(Debug, Clone, Default)]
pub struct SnodePool {
    snodes: HashSet<SnodeTarget>,
}

impl SnodePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pool contents.
    pub fn replace(&mut self, snodes: impl IntoIterator<Item = SnodeTarget>) {
        self.snodes = snodes.into_iter().collect();
    }

    /// Remove a snode; returns whether it was present.
    pub fn remove(&mut self, target: &SnodeTarget) -> bool {
        self.snodes.remove(target)
    }

    /// Whether `target` is pooled.
    pub fn contains(&self, target: &SnodeTarget) -> bool {
        self.snodes.contains(target)
    }

    /// Number of pooled snodes.
    pub fn len(&self) -> usize {
        self.snodes.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.snodes.is_empty()
    }

    /// Pick a snode uniformly at random, skipping `exclude`.
    pub fn choose<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        exclude: Option<&SnodeTarget>,
    ) -> Option<SnodeTarget> {
        self.snodes
            .iter()
            .filter(|snode| Some(*snode) != exclude)
            .choose(rng)
            .cloned()
    }
}
