//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::domain::SwarmError;

/// Cap on the backoff exponent.
const MAX_BACKOFF_SHIFT: u32 = 6;

/// Delay before retry number `attempt` (1-based).
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1 << attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT))
}

/// Run `operation` once plus up to `max_retries` more times.
///
/// Non-retryable errors are returned immediately. Proof-of-work rejections
/// retry without waiting, since the next attempt re-stamps with the updated
/// difficulty. Exhaustion returns the last error.
pub(crate) async fn retry_if_needed<T, F, Fut>(
    max_retries: u32,
    base_backoff: Duration,
    mut operation: F,
) -> Result<T, SwarmError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, SwarmError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() || attempt >= max_retries => return Err(err),
            Err(err) => {
                attempt += 1;
                if err.requires_restamp() {
                    debug!(attempt, "Retrying with a fresh proof of work");
                    continue;
                }
                let delay = backoff_delay(base_backoff, attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "Retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
