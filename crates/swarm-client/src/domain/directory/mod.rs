//! # Directory State
//!
//! Pure bookkeeping behind the snode directory: consecutive-failure counts
//! and the shared random snode pool. Synchronization lives in the service
//! layer.

mod failures;
mod pool;

pub use failures::{FailureCounter, FailureOutcome};
pub use pool::SnodePool;

#[cfg(test)]
mod tests;
