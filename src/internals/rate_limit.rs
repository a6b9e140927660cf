//! Token bucket rate limiting for backend calls
//!
//! Wraps a `governor` GCRA limiter. Acquisition is atomic, so concurrent
//! callers sharing one limiter never over-draw the budget. A caller that
//! finds the bucket empty waits for a token, up to `max_wait`.

use crate::config::RateLimitConfig;
use crate::error::{GenError, GenResult};
use crate::logging::{log_debug, log_warn};

use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    limiter: Option<DefaultDirectRateLimiter>,
    config: RateLimitConfig,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Build a limiter; a disabled config yields one that never waits.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::ConfigurationError`] for a non-positive rate or a
    /// zero burst.
    pub fn new(config: RateLimitConfig) -> GenResult<Self> {
        config.validate()?;

        let limiter = if config.enabled {
            let period = Duration::from_secs_f64(1.0 / config.requests_per_second);
            let burst = NonZeroU32::new(config.burst_size)
                .ok_or_else(|| GenError::configuration_error("burst_size must be at least 1"))?;
            let quota = Quota::with_period(period)
                .ok_or_else(|| {
                    GenError::configuration_error(format!(
                        "requests_per_second {} is too high",
                        config.requests_per_second
                    ))
                })?
                .allow_burst(burst);
            Some(governor::RateLimiter::direct(quota))
        } else {
            None
        };

        Ok(Self { limiter, config })
    }

    /// A limiter that never waits.
    pub fn disabled() -> Self {
        Self {
            limiter: None,
            config: RateLimitConfig::disabled(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait for a token.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Timeout`] when no token became available within
    /// `max_wait`.
    pub async fn acquire(&self) -> GenResult<()> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        if limiter.check().is_ok() {
            return Ok(());
        }

        let wait_start = Instant::now();
        match tokio::time::timeout(self.config.max_wait, limiter.until_ready()).await {
            Ok(()) => {
                log_debug!(
                    waited_ms = wait_start.elapsed().as_millis(),
                    "Rate limit token acquired after waiting"
                );
                Ok(())
            }
            Err(_elapsed) => {
                log_warn!(
                    max_wait_ms = self.config.max_wait.as_millis(),
                    requests_per_second = self.config.requests_per_second,
                    "Gave up waiting for a rate limit token"
                );
                Err(GenError::timeout(
                    u64::try_from(self.config.max_wait.as_millis()).unwrap_or(u64::MAX),
                ))
            }
        }
    }

    /// Take a token only if one is available right now.
    pub fn try_acquire(&self) -> bool {
        self.limiter
            .as_ref()
            .map_or(true, |limiter| limiter.check().is_ok())
    }
}
