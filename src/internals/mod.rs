//! Resilience plumbing shared by every backend: retry and rate limiting.

pub mod rate_limit;
pub mod retry;

pub use rate_limit::RateLimiter;
pub use retry::{RetryExecutor, RetryPolicy};
