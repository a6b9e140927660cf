//! Retry logic with exponential backoff
//!
//! Backend calls are retried on transient failures (timeouts, 5xx responses,
//! dropped connections, rate limiting) with exponential backoff and up to 10%
//! jitter. Any other failure is returned immediately. Exhausting the attempt
//! budget surfaces [`GenError::ProviderUnavailable`].

use crate::error::{GenError, GenResult};
use crate::logging::{log_debug, log_error};

use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Retry policy configuration for backend calls
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum total operation time
    pub total_timeout: Duration,
    /// Request timeout for individual attempts
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
            total_timeout: Duration::from_secs(120),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Runs an operation under a [`RetryPolicy`].
///
/// Holds no mutable state, so one executor can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    provider: String,
}

impl RetryExecutor {
    /// Create a new retry executor for the named backend
    pub fn new(policy: RetryPolicy, provider: impl Into<String>) -> Self {
        Self {
            policy,
            provider: provider.into(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T>(&self, operation: F) -> GenResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = GenResult<T>>,
    {
        let start_time = Instant::now();
        let mut attempt = 0;
        let mut last_error: Option<GenError> = None;

        while attempt < self.policy.max_attempts {
            if start_time.elapsed() >= self.policy.total_timeout {
                last_error = Some(GenError::timeout(duration_ms(self.policy.total_timeout)));
                break;
            }

            attempt += 1;
            log_debug!(
                provider = %self.provider,
                attempt = attempt,
                max_attempts = self.policy.max_attempts,
                "Executing backend call with retry logic"
            );

            let operation_start = Instant::now();
            let error = match tokio::time::timeout(self.policy.request_timeout, operation()).await {
                Ok(Ok(response)) => {
                    log_debug!(
                        provider = %self.provider,
                        attempt = attempt,
                        duration_ms = operation_start.elapsed().as_millis(),
                        "Backend call succeeded"
                    );
                    return Ok(response);
                }
                Ok(Err(error)) => error,
                Err(_elapsed) => GenError::timeout(duration_ms(self.policy.request_timeout)),
            };

            if !error.is_retryable() {
                log_debug!(
                    provider = %self.provider,
                    attempt = attempt,
                    error = %error,
                    "Non-transient failure, not retrying"
                );
                return Err(error);
            }

            if attempt < self.policy.max_attempts {
                let delay = self.delay_for(attempt, &error);
                log_debug!(
                    provider = %self.provider,
                    attempt = attempt,
                    max_attempts = self.policy.max_attempts,
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "Transient failure, retrying after delay"
                );
                sleep(delay).await;
            }
            last_error = Some(error);
        }

        self.handle_exhausted_retries(attempt, last_error, &start_time)
    }

    fn handle_exhausted_retries<T>(
        &self,
        attempts: u32,
        last_error: Option<GenError>,
        start_time: &Instant,
    ) -> GenResult<T> {
        let message = last_error.map_or_else(
            || "maximum retry attempts exceeded".to_string(),
            |error| error.to_string(),
        );

        log_error!(
            provider = %self.provider,
            attempts = attempts,
            total_duration_ms = start_time.elapsed().as_millis(),
            error = %message,
            "Backend call failed after all retry attempts"
        );

        Err(GenError::provider_unavailable(
            self.provider.clone(),
            attempts,
            message,
        ))
    }

    /// Backoff for the given attempt, stretched to honor a Retry-After hint
    fn delay_for(&self, attempt: u32, error: &GenError) -> Duration {
        let delay = self.calculate_delay(attempt);
        match error {
            GenError::RateLimitExceeded {
                retry_after_seconds,
            } => delay.max(Duration::from_secs(*retry_after_seconds).min(self.policy.max_delay)),
            _ => delay,
        }
    }

    /// Calculate delay for exponential backoff
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_seconds =
            self.policy.initial_delay.as_secs_f64() * self.policy.backoff_multiplier.powi(exponent);

        let delay = Duration::from_secs_f64(delay_seconds.min(self.policy.max_delay.as_secs_f64()));

        // Up to 10% jitter
        let jitter = fastrand::f64() * 0.1;
        Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter))
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
