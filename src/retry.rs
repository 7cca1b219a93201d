//! Bounded exponential backoff for rate-limited hosting calls.

use crate::cancel::Cancellation;
use crate::config::defaults::{DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_MS};
use crate::error::Result;
use std::time::Duration;

/// Retry policy applied to a single hosting API call.
///
/// Only rate-limit responses (403/429) are retried; the delay before retry
/// `n` (0-based) is `min(initial_delay * 2^n, max_delay)`. Every other error,
/// including 404, goes straight back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Ceiling on any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Policy with the default 2s initial / 15s max delays.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }

    /// Policy that retries without waiting.
    #[must_use]
    pub const fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Backoff delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op`, retrying on rate limiting.
    ///
    /// The token is checked before every attempt and interrupts backoff waits.
    pub fn run<T, F>(&self, cancel: &Cancellation, context: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            cancel.check(context)?;
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limited() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::debug!(
                        "{context}: rate limited, retry {} of {} in {:?}",
                        attempt + 1,
                        self.max_retries,
                        delay
                    );
                    cancel.sleep(delay, context)?;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_rate_limited() {
                        tracing::warn!("{context}: still rate limited after {attempt} retries");
                    }
                    return Err(err);
                }
            }
        }
    }
}
