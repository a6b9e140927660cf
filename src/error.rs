//! Error types for test generation.
//!
//! This module provides structured error handling for the generation
//! pipeline, including categorization, severity levels, and retry guidance.
//!
//! # Error Types
//!
//! The main error type is [`GenError`], which covers all failure modes:
//! - Configuration and specification errors (unsupported test type, missing key)
//! - Backend failures (network issues, 5xx responses, rate limiting, timeouts)
//! - Exhausted retries and credential problems
//! - Formatter input that violates the test case invariants
//!
//! Recoverable parsing problems are not errors. Parsers report them as
//! [`ParseDegraded`](crate::core_types::ParseDegraded) values that end up as
//! warnings on the result.
//!
//! # Error Handling Example
//!
//! ```rust,no_run
//! use testgen_llm::{GenError, error::ErrorCategory};
//!
//! fn handle_error(err: GenError) {
//!     if err.is_fatal() {
//!         println!("Request cannot succeed: {}", err.user_message());
//!         return;
//!     }
//!
//!     match err.category() {
//!         ErrorCategory::Transient => println!("Temporary issue, try again later"),
//!         ErrorCategory::Client => println!("Fix the request and try again"),
//!         _ => println!("Backend issue: {err}"),
//!     }
//! }
//! ```

use crate::core_types::SkippedVariant;
use crate::logging::{log_error, log_warn};
use thiserror::Error;

// ============================================================================
// Error categorization types
// ============================================================================

/// High-level categorization of errors for routing and handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Model backend or network failures.
    External,

    /// Internal contract violations (should be unreachable).
    Internal,

    /// Caller mistakes: invalid specification, empty input, credentials, configuration.
    Client,

    /// Temporary failures that should be retried.
    ///
    /// Rate limits, timeouts, 5xx responses and dropped connections.
    Transient,
}

/// Severity level for logging and alerting decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Nothing usable could be produced.
    Critical,

    /// Action failed but the pipeline is stable.
    Error,

    /// Unexpected but recoverable situation.
    Warning,

    /// Expected failure, log at info/debug level.
    Info,
}

// ============================================================================
// Generation error types
// ============================================================================

/// Convenient result type for generation operations.
pub type GenResult<T> = std::result::Result<T, GenError>;

/// Errors that can occur while generating or rendering test cases.
///
/// Use the constructor methods, which log the error at the appropriate
/// level:
///
/// ```rust
/// use testgen_llm::GenError;
///
/// let err = GenError::invalid_specification("unsupported test type: smoke");
/// assert!(err.is_fatal());
///
/// let err = GenError::timeout(30_000);
/// assert!(err.is_retryable());
/// ```
///
/// | Variant | Category | Retryable | Fatal |
/// |---------|----------|-----------|-------|
/// | `ConfigurationError` | Client | No | Yes |
/// | `InvalidSpecification` | Client | No | Yes |
/// | `EmptyInput` | Client | No | Yes |
/// | `RequestFailed` | External / Transient | without status or 5xx | No |
/// | `MalformedRequest` | Client | No | No |
/// | `RateLimitExceeded` | Transient | Yes | No |
/// | `Timeout` | Transient | Yes | No |
/// | `ProviderAuthFailure` | Client | No | Yes |
/// | `ProviderUnavailable` | External | No | No |
/// | `ResponseParsingError` | External | No | No |
/// | `MalformedResult` | Internal | No | No |
/// | `NothingProduced` | External | No | No |
#[derive(Error, Debug)]
pub enum GenError {
    /// Backend configuration is invalid or incomplete.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// The caller requested an unsupported test type, level, format or priority.
    #[error("Invalid test specification: {message}")]
    InvalidSpecification {
        /// What was rejected.
        message: String,
    },

    /// Requirement input was empty after trimming.
    #[error("Requirement input is empty: {field}")]
    EmptyInput {
        /// The input that was empty.
        field: String,
    },

    /// The HTTP request to the backend failed.
    ///
    /// Without a status this is a transport failure (connection reset,
    /// refused, DNS) and is retried. With a 5xx status it is retried too.
    #[error("Request failed: {message}")]
    RequestFailed {
        /// Description of the failure.
        message: String,
        /// HTTP status, when the backend answered.
        status: Option<u16>,
        /// The underlying error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend rejected the request as malformed (4xx other than auth/408/429).
    #[error("Malformed request ({status}): {message}")]
    MalformedRequest {
        /// HTTP status returned by the backend.
        status: u16,
        /// Backend error body.
        message: String,
    },

    /// Backend rate limit exceeded.
    #[error("Rate limit exceeded, retry after {retry_after_seconds}s")]
    RateLimitExceeded {
        /// Recommended wait time before retrying.
        retry_after_seconds: u64,
    },

    /// A request, or a wait for a rate-limit token, timed out.
    #[error("Timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that was exceeded.
        timeout_ms: u64,
    },

    /// Credentials were rejected. Never retried.
    #[error("Provider authentication failed: {message}")]
    ProviderAuthFailure {
        /// Details about the authentication failure.
        message: String,
    },

    /// All retries were exhausted, or no backend is configured and fallback is disabled.
    #[error("Provider '{provider}' unavailable after {attempts} attempt(s): {message}")]
    ProviderUnavailable {
        /// Backend name.
        provider: String,
        /// Number of attempts made.
        attempts: u32,
        /// Last failure seen.
        message: String,
    },

    /// The backend answered 2xx but the body could not be read.
    #[error("Response parsing failed: {message}")]
    ResponseParsingError {
        /// Details about the parsing failure.
        message: String,
    },

    /// A formatter received a result that violates the test case invariants.
    #[error("Malformed result in test case '{test_case_id}': {message}")]
    MalformedResult {
        /// The offending test case.
        test_case_id: String,
        /// Which invariant failed.
        message: String,
    },

    /// Every requested test type was skipped.
    #[error("No test cases produced; {} test type(s) skipped", skipped.len())]
    NothingProduced {
        /// Why each variant was skipped, in request order.
        skipped: Vec<SkippedVariant>,
    },
}

impl GenError {
    /// Get the error category for routing and handling decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError { .. } => ErrorCategory::Client,
            Self::InvalidSpecification { .. } => ErrorCategory::Client,
            Self::EmptyInput { .. } => ErrorCategory::Client,
            Self::RequestFailed { .. } if self.is_retryable() => ErrorCategory::Transient,
            Self::RequestFailed { .. } => ErrorCategory::External,
            Self::MalformedRequest { .. } => ErrorCategory::Client,
            Self::RateLimitExceeded { .. } => ErrorCategory::Transient,
            Self::Timeout { .. } => ErrorCategory::Transient,
            Self::ProviderAuthFailure { .. } => ErrorCategory::Client,
            Self::ProviderUnavailable { .. } => ErrorCategory::External,
            Self::ResponseParsingError { .. } => ErrorCategory::External,
            Self::MalformedResult { .. } => ErrorCategory::Internal,
            Self::NothingProduced { .. } => ErrorCategory::External,
        }
    }

    /// Get the error severity for logging and alerting.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigurationError { .. } => ErrorSeverity::Error,
            Self::InvalidSpecification { .. } => ErrorSeverity::Info,
            Self::EmptyInput { .. } => ErrorSeverity::Info,
            Self::RequestFailed { .. } => ErrorSeverity::Warning,
            Self::MalformedRequest { .. } => ErrorSeverity::Error,
            Self::RateLimitExceeded { .. } => ErrorSeverity::Warning,
            Self::Timeout { .. } => ErrorSeverity::Warning,
            Self::ProviderAuthFailure { .. } => ErrorSeverity::Error,
            Self::ProviderUnavailable { .. } => ErrorSeverity::Error,
            Self::ResponseParsingError { .. } => ErrorSeverity::Warning,
            Self::MalformedResult { .. } => ErrorSeverity::Critical,
            Self::NothingProduced { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether this error is transient and should trigger a retry.
    ///
    /// Returns `true` for rate limits, timeouts, transport failures and
    /// 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimitExceeded { .. } | Self::Timeout { .. } => true,
            Self::RequestFailed { status, .. } => status.map_or(true, |code| code >= 500),
            _ => false,
        }
    }

    /// Whether this error aborts a whole generation request.
    ///
    /// Non-fatal errors only skip the test type they occurred in.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidSpecification { .. }
                | Self::ProviderAuthFailure { .. }
                | Self::ConfigurationError { .. }
                | Self::EmptyInput { .. }
        )
    }

    /// Convert to a user-friendly message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigurationError { .. } => {
                "Model backend configuration issue. Please check your settings".to_string()
            }
            Self::InvalidSpecification { message } => {
                format!("The requested test specification is not supported: {message}")
            }
            Self::EmptyInput { field } => format!("Please provide {field} to generate tests from"),
            Self::RequestFailed { .. } => {
                "Unable to communicate with the model backend. Please try again".to_string()
            }
            Self::MalformedRequest { .. } => {
                "The model backend rejected the request".to_string()
            }
            Self::RateLimitExceeded {
                retry_after_seconds,
            } => {
                format!("Backend is busy. Please wait {retry_after_seconds} seconds and try again")
            }
            Self::Timeout { .. } => "Request timed out. Please try again".to_string(),
            Self::ProviderAuthFailure { .. } => {
                "Authentication failed. Please check your credentials".to_string()
            }
            Self::ProviderUnavailable { .. } => {
                "The model backend is unavailable. Try again or use offline mode".to_string()
            }
            Self::ResponseParsingError { .. } => {
                "Received an invalid response from the model backend".to_string()
            }
            Self::MalformedResult { test_case_id, .. } => {
                format!("Test case {test_case_id} could not be rendered")
            }
            Self::NothingProduced { .. } => {
                "No test cases could be generated for this request".to_string()
            }
        }
    }

    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================

    pub fn configuration_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration_error",
            message = %message,
            "Generator configuration validation failed"
        );
        Self::ConfigurationError { message }
    }

    pub fn invalid_specification(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "invalid_specification",
            message = %message,
            "Test specification rejected"
        );
        Self::InvalidSpecification { message }
    }

    pub fn empty_input(field: impl Into<String>) -> Self {
        let field = field.into();
        log_warn!(
            error_type = "empty_input",
            field = %field,
            "Requirement input is empty"
        );
        Self::EmptyInput { field }
    }

    pub fn request_failed(
        message: impl Into<String>,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "request_failed",
            message = %message,
            status = ?status,
            has_source = source.is_some(),
            "Backend request failed"
        );
        Self::RequestFailed {
            message,
            status,
            source,
        }
    }

    pub fn malformed_request(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "malformed_request",
            status = status,
            message = %message,
            "Backend rejected request"
        );
        Self::MalformedRequest { status, message }
    }

    pub fn rate_limit_exceeded(retry_after_seconds: u64) -> Self {
        log_warn!(
            error_type = "rate_limit_exceeded",
            retry_after_seconds = retry_after_seconds,
            "Backend rate limit exceeded"
        );
        Self::RateLimitExceeded {
            retry_after_seconds,
        }
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        log_warn!(
            error_type = "timeout",
            timeout_ms = timeout_ms,
            "Operation timed out"
        );
        Self::Timeout { timeout_ms }
    }

    pub fn provider_auth_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "provider_auth_failure",
            message = %message,
            "Backend authentication failed"
        );
        Self::ProviderAuthFailure { message }
    }

    pub fn provider_unavailable(
        provider: impl Into<String>,
        attempts: u32,
        message: impl Into<String>,
    ) -> Self {
        let provider = provider.into();
        let message = message.into();
        log_error!(
            error_type = "provider_unavailable",
            provider = %provider,
            attempts = attempts,
            message = %message,
            "Backend unavailable"
        );
        Self::ProviderUnavailable {
            provider,
            attempts,
            message,
        }
    }

    pub fn response_parsing_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "response_parsing_error",
            message = %message,
            "Backend response body invalid"
        );
        Self::ResponseParsingError { message }
    }

    pub fn malformed_result(test_case_id: impl Into<String>, message: impl Into<String>) -> Self {
        let test_case_id = test_case_id.into();
        let message = message.into();
        log_error!(
            error_type = "malformed_result",
            test_case_id = %test_case_id,
            message = %message,
            "Formatter received an invalid test case"
        );
        Self::MalformedResult {
            test_case_id,
            message,
        }
    }

    pub fn nothing_produced(skipped: Vec<SkippedVariant>) -> Self {
        log_error!(
            error_type = "nothing_produced",
            skipped = skipped.len(),
            "Every requested test type was skipped"
        );
        Self::NothingProduced { skipped }
    }
}
