//! Exponential backoff for rate-limited synthesis calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::base::{TTSError, TTSResult};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;

/// Retries only [`TTSError::RateLimited`]; every other error is returned on
/// the attempt that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
        )
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; values below 1 are raised to 1.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `retry` (1-based): initial, 2x, 4x, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.initial_delay.saturating_mul(1u32 << exponent)
    }

    /// Run `operation` until it succeeds, fails with a non-rate-limit error,
    /// or the attempts are used up. The closure receives the 1-based attempt.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> TTSResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = TTSResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_rate_limited() => {
                    if attempt >= self.max_attempts {
                        return Err(TTSError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Synthesis rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
