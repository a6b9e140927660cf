// Unit Tests for Rate Limiting
//
// UNIT UNDER TEST: RateLimiter
//
// BUSINESS RESPONSIBILITY:
//   - Spaces backend calls to the configured requests per second
//   - Shares one token bucket across concurrent callers without over-drawing
//   - Fails a wait that exceeds max_wait with a retryable timeout
//
// TEST COVERAGE:
//   - Sequential acquisition pacing (R=20, N=5 takes at least 200ms)
//   - Sliding-window bound under concurrency (R=4: no more than 4 per second)
//   - Disabled limiter never waits
//   - Max wait exceeded maps to Timeout
//
// NOTE: governor uses the real clock, so these tests measure wall time.

use crate::config::RateLimitConfig;
use crate::error::GenError;
use crate::internals::RateLimiter;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(test)]
mod pacing_tests {
    use super::*;

    #[tokio::test]
    async fn test_sequential_calls_are_spaced_by_the_rate() {
        // Test verifies N=5 calls at R=20/s take at least (N-1)/R = 200ms

        // Arrange
        let limiter = RateLimiter::new(RateLimitConfig::per_second(20.0)).expect("valid config");
        let start = Instant::now();

        // Act
        for _ in 0..5 {
            limiter.acquire().await.expect("token within max wait");
        }
        let elapsed = start.elapsed();

        // Assert
        assert!(
            elapsed >= Duration::from_millis(195),
            "5 calls at 20/s should take about 200ms, took {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_concurrent_callers_never_exceed_rate_in_any_window() {
        // Test verifies 6 concurrent callers at R=4/s never fit 5 calls into one second

        // Arrange
        let limiter =
            Arc::new(RateLimiter::new(RateLimitConfig::per_second(4.0)).expect("valid config"));
        let start = Instant::now();

        // Act
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await.expect("token within max wait");
                    start.elapsed()
                })
            })
            .collect();
        let mut grants = Vec::new();
        for handle in handles {
            grants.push(handle.await.expect("task completes"));
        }
        grants.sort();

        // Assert
        for window in grants.windows(5) {
            let span = window[4] - window[0];
            assert!(
                span >= Duration::from_millis(950),
                "Five grants fell within {span:?}, more than 4 per second"
            );
        }
    }

    #[tokio::test]
    async fn test_disabled_limiter_never_waits() {
        // Arrange
        let limiter = RateLimiter::disabled();
        let start = Instant::now();

        // Act
        for _ in 0..50 {
            limiter.acquire().await.expect("disabled limiter always grants");
        }

        // Assert
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(limiter.try_acquire(), "Disabled limiter always has tokens");
    }
}

#[cfg(test)]
mod wait_limit_tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_beyond_max_wait_is_a_timeout() {
        // Test verifies a caller gives up after max_wait with a retryable error

        // Arrange
        let config = RateLimitConfig {
            requests_per_second: 0.5,
            max_wait: Duration::from_millis(50),
            ..RateLimitConfig::default()
        };
        let limiter = RateLimiter::new(config).expect("valid config");
        limiter.acquire().await.expect("first token is immediate");

        // Act
        let result = limiter.acquire().await;

        // Assert
        match result {
            Err(error @ GenError::Timeout { .. }) => {
                assert!(error.is_retryable(), "Rate-limit wait timeouts are retryable");
            }
            other => panic!("Expected Timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_try_acquire_reports_empty_bucket() {
        // Arrange
        let limiter = RateLimiter::new(RateLimitConfig::per_second(1.0)).expect("valid config");

        // Act
        let first = limiter.try_acquire();
        let second = limiter.try_acquire();

        // Assert
        assert!(first, "First token is available");
        assert!(!second, "Bucket of one should be empty right after");
    }

    #[test]
    fn test_invalid_rate_is_rejected_at_construction() {
        // Arrange & Act
        let result = RateLimiter::new(RateLimitConfig::per_second(0.0));

        // Assert
        assert!(matches!(result, Err(GenError::ConfigurationError { .. })));
    }
}
