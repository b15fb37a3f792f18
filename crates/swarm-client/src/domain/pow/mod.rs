//! # Proof of Work
//!
//! Hashcash-style stamp required by snodes before a message is stored.
//!
//! ## Algorithm
//!
//! 1. `payload = timestamp ‖ ttl ‖ destination ‖ data` (decimal numbers, raw strings)
//! 2. `initial = SHA512(payload)`
//! 3. `size = len(payload) + 8`, `inner = (ttl / 1000) * size / 65535`
//! 4. `target = (2^64 - 1) / (difficulty * (size + inner))`
//! 5. The nonce is the first `n >= 1` with
//!    `u64_be(SHA512(u64_be(n) ‖ initial)[..8]) <= target`
//!
//! The result must match bit-for-bit what snodes verify, so the formula is
//! kept exactly as the network defines it.

use primitive_types::U256;
use sha2::{Digest, Sha512};

use super::errors::SwarmError;

/// Width of the nonce in bytes.
pub const NONCE_LENGTH: usize = 8;

/// Divisor applied to the TTL term of the target.
const TTL_DIVISOR: u64 = 65_535;

/// Inputs to one proof-of-work computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOfWork<'a> {
    /// Base64 message data
    pub data: &'a str,
    /// Recipient public key (hex)
    pub destination: &'a str,
    /// Milliseconds since the epoch
    pub timestamp_ms: u64,
    /// Time to live in milliseconds
    pub ttl_ms: u64,
    /// Network difficulty multiplier
    pub difficulty: u64,
}

impl ProofOfWork<'_> {
    /// The byte string the nonce commits to.
    pub fn payload(&self) -> Vec<u8> {
        format!(
            "{}{}{}{}",
            self.timestamp_ms, self.ttl_ms, self.destination, self.data
        )
        .into_bytes()
    }

    /// Largest acceptable trial value.
    pub fn target(&self) -> Result<u64, SwarmError> {
        target_threshold(self.payload().len(), self.ttl_ms, self.difficulty)
    }

    /// Search for the first satisfying nonce.
    ///
    /// CPU bound; run it on a blocking thread.
    pub fn compute(&self) -> Result<[u8; NONCE_LENGTH], SwarmError> {
        let payload = self.payload();
        let target = target_threshold(payload.len(), self.ttl_ms, self.difficulty)?;
        let initial_hash = Sha512::digest(&payload);

        let mut nonce: u64 = 1;
        loop {
            if trial_value(nonce, &initial_hash) <= target {
                return Ok(nonce.to_be_bytes());
            }
            nonce = nonce.checked_add(1).ok_or_else(|| {
                SwarmError::ComputationFailed("nonce space exhausted".to_string())
            })?;
        }
    }

    /// Check a nonce against this computation's target.
    pub fn verify(&self, nonce: [u8; NONCE_LENGTH]) -> bool {
        let Ok(target) = self.target() else {
            return false;
        };
        let initial_hash = Sha512::digest(self.payload());
        trial_value(u64::from_be_bytes(nonce), &initial_hash) <= target
    }
}

/// Derive the 64-bit target from payload length, TTL and difficulty.
pub fn target_threshold(
    payload_len: usize,
    ttl_ms: u64,
    difficulty: u64,
) -> Result<u64, SwarmError> {
    let size = U256::from(payload_len) + U256::from(NONCE_LENGTH);
    let ttl_secs = U256::from(ttl_ms / 1000);
    let inner = ttl_secs * size / U256::from(TTL_DIVISOR);
    let denominator = U256::from(difficulty) * (size + inner);
    if denominator.is_zero() {
        return Err(SwarmError::ComputationFailed(
            "difficulty must be positive".to_string(),
        ));
    }
    Ok((U256::from(u64::MAX) / denominator).low_u64())
}

/// Compute a nonce for the given message fields.
pub fn compute_nonce(
    data: &str,
    destination: &str,
    timestamp_ms: u64,
    ttl_ms: u64,
    difficulty: u64,
) -> Result<[u8; NONCE_LENGTH], SwarmError> {
    ProofOfWork {
        data,
        destination,
        timestamp_ms,
        ttl_ms,
        difficulty,
    }
    .compute()
}

fn trial_value(nonce: u64, initial_hash: &[u8]) -> u64 {
    let mut hasher = Sha512::new();
    hasher.update(nonce.to_be_bytes());
    hasher.update(initial_hash);
    let digest = hasher.finalize();
    let mut prefix = [0u8; NONCE_LENGTH];
    prefix.copy_from_slice(&digest[..NONCE_LENGTH]);
    u64::from_be_bytes(prefix)
}

#[cfg(test)]
mod tests;
