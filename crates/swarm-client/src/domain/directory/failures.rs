//! Consecutive-failure counting.

use std::collections::HashMap;

use crate::domain::SnodeTarget;

/// Result of recording one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Below threshold; carries the new count
    Counted(u32),
    /// Threshold reached; the caller must evict and then [`FailureCounter::reset`]
    ThresholdReached,
}

/// Per-snode consecutive-failure counts.
#[derive(Debug, Clone)]
pub struct FailureCounter {
    counts: HashMap<SnodeTarget, u32>,
    threshold: u32,
}

impl FailureCounter {
    /// Create a counter that trips at `threshold` failures.
    pub fn new(threshold: u32) -> Self {
        Self {
            counts: HashMap::new(),
            threshold: threshold.max(1),
        }
    }

    /// Increment the count for `target`.
    pub fn record_failure(&mut self, target: &SnodeTarget) -> FailureOutcome {
        let count = self.counts.entry(target.clone()).or_insert(0);
        *count += 1;
        if *count >= self.threshold {
            FailureOutcome::ThresholdReached
        } else {
            FailureOutcome::Counted(*count)
        }
    }

    /// Reset the count for `target` to zero.
    pub fn reset(&mut self, target: &SnodeTarget) {
        self.counts.remove(target);
    }

    /// Current count for `target`.
    pub fn count(&self, target: &SnodeTarget) -> u32 {
        self.counts.get(target).copied().unwrap_or(0)
    }

    /// Configured threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
