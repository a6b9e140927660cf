//! Test helper utilities for testgen-llm integration tests
//!
//! Reusable fixtures shared by the backend and pipeline test files: sample
//! tickets, backend configurations pointed at a wiremock server, and canned
//! model replies in each backend's wire format.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use serde_json::json;
use std::time::Duration;
use testgen_llm::{
    BackendConfig, CustomEndpointConfig, FallbackPolicy, GeneratorConfig, HostedApiConfig,
    LocalServerConfig, OutputFormat, Priority, RateLimitConfig, RetryPolicy, TestLevel,
    TestSpecification, TestType, TicketContent,
};
use wiremock::ResponseTemplate;

/// A reply in the layout generators ask the model for.
pub const MODEL_TEXT: &str = "TEST CASE 1: Reset link is emailed
Description: A known address receives a reset link
Preconditions:
- A registered account exists
Steps:
1. Request a password reset => A confirmation message is shown
2. Open the mailbox => A reset link has arrived
";

/// Route tracing output to the test harness when `RUST_LOG` is set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Requests
// ============================================================================

pub fn reset_ticket() -> TicketContent {
    TicketContent {
        raw_description:
            "As a customer, I want to reset my password so that I can regain access to my account"
                .to_string(),
        acceptance_criteria_text: "Given a registered email address
When a password reset is requested
Then a reset link is emailed
And the link expires after 30 minutes"
            .to_string(),
        ..TicketContent::default()
    }
}

pub fn spec(test_types: &[TestType], output_format: OutputFormat) -> TestSpecification {
    TestSpecification::new(
        test_types.iter().copied(),
        TestLevel::Integration,
        output_format,
        Priority::Medium,
    )
    .expect("at least one test type")
}

// ============================================================================
// Backend configuration (for tests against wiremock)
// ============================================================================

/// Millisecond backoff so retry tests finish quickly.
pub fn fast_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        total_timeout: Duration::from_secs(10),
        request_timeout: Duration::from_secs(5),
    }
}

pub fn local_server_config(base_url: String) -> LocalServerConfig {
    LocalServerConfig {
        base_url,
        default_model: "llama3".to_string(),
        retry_policy: fast_retry_policy(2),
    }
}

pub fn hosted_api_config(base_url: String) -> HostedApiConfig {
    HostedApiConfig {
        api_key: Some("test-key".to_string()),
        base_url,
        default_model: "gpt-4o-mini".to_string(),
        retry_policy: fast_retry_policy(2),
    }
}

pub fn custom_endpoint_config(base_url: String) -> CustomEndpointConfig {
    CustomEndpointConfig {
        base_url,
        api_key: None,
        model: Some("house-model".to_string()),
        retry_policy: fast_retry_policy(2),
    }
}

/// Generator configuration with a local server backend and no rate limiting.
pub fn live_config(base_url: String) -> GeneratorConfig {
    GeneratorConfig {
        rate_limit: RateLimitConfig::disabled(),
        fallback: FallbackPolicy::Disabled,
        ..GeneratorConfig::with_backend(BackendConfig::LocalServer(local_server_config(base_url)))
    }
}

// ============================================================================
// Canned replies
// ============================================================================

pub fn local_server_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "llama3",
        "response": text,
        "done": true
    }))
}

pub fn chat_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    }))
}

pub fn error_reply(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "error": {"message": message}
    }))
}
