//! Retry execution with exponential backoff and jitter.
//!
//! Wraps one external call in capped attempts under the service-class
//! concurrency limit. The permit is held for the full duration of all
//! attempts: a retrying item must not free its slot for another item to
//! push the provider past its rate limit.

use super::limiter::{LimiterRegistry, ServiceClass};
use crate::errors::{ProviderError, RetryError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Retry policy for one external call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum calls, including the initial attempt.
    pub max_attempts: usize,
    /// Base delay; attempt k waits `base * 2^k` plus up to 50% jitter.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum attempts (minimum 1).
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// The un-jittered delay before retry attempt `attempt` (1-indexed).
    #[must_use]
    pub fn min_backoff(&self, attempt: usize) -> Duration {
        let factor = 2f64.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
        Duration::from_secs_f64(self.base_delay.as_secs_f64() * factor)
    }

    /// The jittered delay before retry attempt `attempt` (1-indexed).
    #[must_use]
    pub fn backoff(&self, attempt: usize) -> Duration {
        let base = self.min_backoff(attempt).as_secs_f64();
        let jitter = if base > 0.0 {
            rand::thread_rng().gen_range(0.0..=0.5 * base)
        } else {
            0.0
        };
        Duration::from_secs_f64(base + jitter)
    }
}

/// Executes `op` with retries under the service-class concurrency limit.
///
/// Attempt 0 runs as soon as a permit is acquired; each retry sleeps the
/// policy's exponential backoff first. Errors the provider marked
/// non-retryable abort immediately; exhaustion returns the last error.
pub async fn call_with_retry<R, F, Fut>(
    limiters: &LimiterRegistry,
    class: ServiceClass,
    policy: RetryPolicy,
    mut op: F,
) -> Result<R, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, ProviderError>>,
{
    // Held across every attempt, by design: see module docs.
    let _permit = limiters.acquire(class).await;

    let mut attempt = 0usize;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(RetryError::Fatal(err)),
            Err(err) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    service = %class,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "call failed, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
