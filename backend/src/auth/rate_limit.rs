//! Login attempt rate limiting, keyed by request source.
//!
//! Applied before any credential check so a throttled source learns nothing
//! about credential validity.

use crate::errors::{ServiceError, ServiceResult};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::keyed::DefaultKeyedStateStore,
};
use std::num::NonZeroU32;
use std::time::Duration;

/// Per-source login rate limiter.
///
/// Allows at most `max_attempts` per `window_seconds` from a single source,
/// with attempts replenishing gradually over the window.
pub struct LoginRateLimiter {
    limiter: RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>,
    max_attempts: u32,
    window_seconds: u64,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, window_seconds: u64) -> Self {
        let burst = NonZeroU32::new(max_attempts).unwrap_or(NonZeroU32::new(1).unwrap());
        let replenish_period =
            Duration::from_secs((window_seconds / u64::from(max_attempts.max(1))).max(1));

        let quota = Quota::with_period(replenish_period)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: RateLimiter::keyed(quota),
            max_attempts,
            window_seconds,
        }
    }

    /// Records an attempt from `source`; rejects once the source has
    /// exhausted its window.
    pub fn check(&self, source: &str) -> ServiceResult<()> {
        self.limiter
            .check_key(&source.to_string())
            .map_err(|_| ServiceError::rate_limited(self.max_attempts, self.window_seconds))
    }
}
