// Unit Tests for ProviderClient
//
// UNIT UNDER TEST: ProviderClient (offline, new, from_config, invoke)
//
// BUSINESS RESPONSIBILITY:
//   - Presents one prompt-in, text-out interface over every backend
//   - Answers offline when no backend is configured or determinism is requested
//   - Wraps live calls in rate limiting and retries
//   - Refuses to answer when no backend exists and fallback is disabled
//
// TEST COVERAGE:
//   - Offline synthesis without any backend
//   - Deterministic options bypassing a configured backend
//   - Retry until success and exhausted attempt budgets, against a mock backend
//   - No retry for rejected credentials
//   - Fallback policy decisions
//   - Construction from configuration

use crate::client::ProviderClient;
use crate::config::{
    BackendConfig, FallbackPolicy, GeneratorConfig, LocalServerConfig, RateLimitConfig,
};
use crate::core_types::TestType;
use crate::error::GenError;
use crate::generators::PromptBuilder;
use crate::providers::{InvokeOptions, MockProviderBackend, ProviderBackend};
use crate::tests::helpers::{fast_retry_policy, login_requirements, spec_for};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn client_with(backend: MockProviderBackend, fallback: FallbackPolicy) -> ProviderClient {
    let backend: Arc<dyn ProviderBackend> = Arc::new(backend);
    ProviderClient::new(
        Some(backend),
        fast_retry_policy(3),
        RateLimitConfig::disabled(),
        fallback,
    )
    .expect("valid client")
}

fn named_backend() -> MockProviderBackend {
    let mut backend = MockProviderBackend::new();
    backend.expect_provider_name().return_const("mock-backend");
    backend
}

fn login_prompt() -> String {
    PromptBuilder.build(
        &login_requirements(),
        &spec_for(&[TestType::Functional]),
        TestType::Functional,
    )
}

#[cfg(test)]
mod offline_tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_client_synthesizes_a_response() {
        // Arrange
        let client = ProviderClient::offline();

        // Act
        let response = client
            .invoke(&login_prompt(), &InvokeOptions::default())
            .await
            .expect("offline client always answers");

        // Assert
        assert_eq!(client.provider_name(), "offline");
        assert!(response.starts_with("TEST CASE 1:"));
    }

    #[tokio::test]
    async fn test_deterministic_options_bypass_the_backend() {
        // Test verifies the backend is never called when determinism is requested

        // Arrange
        let mut backend = named_backend();
        backend.expect_complete().never();
        let client = client_with(backend, FallbackPolicy::WhenUnconfigured);

        // Act
        let response = client
            .invoke(&login_prompt(), &InvokeOptions::deterministic())
            .await;

        // Assert
        assert!(response.expect("synthesized").contains("TEST CASE 1:"));
    }

    #[test]
    fn test_fallback_policy_decisions() {
        // Arrange
        let offline = ProviderClient::offline();
        let live = client_with(named_backend(), FallbackPolicy::WhenUnconfigured);
        let forced = client_with(named_backend(), FallbackPolicy::Always);
        let options = InvokeOptions::default();

        // Act & Assert
        assert!(offline.uses_fallback(&options));
        assert!(!live.uses_fallback(&options), "Configured backend is used");
        assert!(live.uses_fallback(&InvokeOptions::deterministic()));
        assert!(forced.uses_fallback(&options));
    }

    #[tokio::test]
    async fn test_no_backend_with_fallback_disabled_is_unavailable() {
        // Arrange
        let client = ProviderClient::new(
            None,
            fast_retry_policy(3),
            RateLimitConfig::disabled(),
            FallbackPolicy::Disabled,
        )
        .expect("valid client");

        // Act
        let result = client.invoke("prompt", &InvokeOptions::default()).await;

        // Assert
        assert!(matches!(result, Err(GenError::ProviderUnavailable { .. })));
    }
}

#[cfg(test)]
mod live_backend_tests {
    use super::*;

    #[tokio::test]
    async fn test_transient_failures_are_retried_until_success() {
        // Arrange
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let mut backend = named_backend();
        backend.expect_complete().times(3).returning(move |_, _| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt < 3 {
                Err(GenError::request_failed("service unavailable", Some(503), None))
            } else {
                Ok("TEST CASE 1: From the model".to_string())
            }
        });
        let client = client_with(backend, FallbackPolicy::Disabled);

        // Act
        let response = client.invoke("prompt", &InvokeOptions::default()).await;

        // Assert
        assert_eq!(response.expect("third attempt succeeds"), "TEST CASE 1: From the model");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_provider_unavailable() {
        // Arrange
        let mut backend = named_backend();
        backend
            .expect_complete()
            .times(3)
            .returning(|_, _| Err(GenError::timeout(500)));
        let client = client_with(backend, FallbackPolicy::Disabled);

        // Act
        let result = client.invoke("prompt", &InvokeOptions::default()).await;

        // Assert
        match result {
            Err(GenError::ProviderUnavailable {
                provider, attempts, ..
            }) => {
                assert_eq!(provider, "mock-backend");
                assert_eq!(attempts, 3);
            }
            other => panic!("Expected ProviderUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_not_retried() {
        // Arrange
        let mut backend = named_backend();
        backend
            .expect_complete()
            .times(1)
            .returning(|_, _| Err(GenError::provider_auth_failure("invalid api key")));
        let client = client_with(backend, FallbackPolicy::Disabled);

        // Act
        let result = client.invoke("prompt", &InvokeOptions::default()).await;

        // Assert
        assert!(matches!(result, Err(GenError::ProviderAuthFailure { .. })));
    }

    #[tokio::test]
    async fn test_options_reach_the_backend() {
        // Arrange
        let mut backend = named_backend();
        backend
            .expect_complete()
            .withf(|prompt, options| prompt.starts_with("prompt") && options.max_tokens == 512)
            .times(1)
            .returning(|_, _| Ok("ok".to_string()));
        let client = client_with(backend, FallbackPolicy::WhenUnconfigured);
        let options = InvokeOptions {
            max_tokens: 512,
            ..InvokeOptions::default()
        };

        // Act
        let response = client.invoke("prompt", &options).await;

        // Assert
        assert_eq!(response.expect("backend answers"), "ok");
    }
}

#[cfg(test)]
mod construction_tests {
    use super::*;

    #[test]
    fn test_from_config_builds_the_configured_backend() {
        // Arrange
        let config =
            GeneratorConfig::with_backend(BackendConfig::LocalServer(LocalServerConfig::default()));

        // Act
        let client = ProviderClient::from_config(&config).expect("valid config");

        // Assert
        assert_eq!(client.provider_name(), "local-server");
        assert!(!client.uses_fallback(&InvokeOptions::default()));
    }

    #[test]
    fn test_from_config_rejects_invalid_rate_limit() {
        // Arrange
        let config = GeneratorConfig {
            rate_limit: RateLimitConfig::per_second(0.0),
            ..GeneratorConfig::default()
        };

        // Act
        let result = ProviderClient::from_config(&config);

        // Assert
        assert!(matches!(result, Err(GenError::ConfigurationError { .. })));
    }
}
