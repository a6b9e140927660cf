use crate::config::{BackendConfig, FallbackPolicy, GeneratorConfig, RateLimitConfig};
use crate::error::{GenError, GenResult};
use crate::internals::{RateLimiter, RetryExecutor, RetryPolicy};
use crate::logging::{log_debug, log_info};
use crate::providers::{build_backend, FallbackSynthesizer, InvokeOptions, ProviderBackend};

use std::sync::Arc;

const OFFLINE: &str = "offline";

/// Uniform prompt-in, text-out client over every backend.
///
/// Live calls are rate limited and retried. When no backend is configured,
/// or the caller asks for deterministic output, the offline synthesizer
/// answers instead and the network is never touched. Callers cannot tell
/// the two paths apart from the response shape.
///
/// One client is meant to be shared (behind an `Arc`) by every generator of
/// a request; its token bucket is the only state concurrent calls share.
pub struct ProviderClient {
    backend: Option<Arc<dyn ProviderBackend>>,
    limiter: RateLimiter,
    retry: RetryExecutor,
    fallback: FallbackPolicy,
    synthesizer: FallbackSynthesizer,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field(
                "backend",
                &self.backend.as_ref().map(|backend| backend.provider_name()),
            )
            .field("limiter", &self.limiter)
            .field("retry", &self.retry)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl ProviderClient {
    /// Wrap an already built backend.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::ConfigurationError`] if the rate limit settings
    /// are invalid.
    pub fn new(
        backend: Option<Arc<dyn ProviderBackend>>,
        retry_policy: RetryPolicy,
        rate_limit: RateLimitConfig,
        fallback: FallbackPolicy,
    ) -> GenResult<Self> {
        let provider = backend
            .as_ref()
            .map_or(OFFLINE, |backend| backend.provider_name());

        log_debug!(
            provider = %provider,
            fallback = ?fallback,
            requests_per_second = rate_limit.requests_per_second,
            max_attempts = retry_policy.max_attempts,
            "Provider client created"
        );

        Ok(Self {
            limiter: RateLimiter::new(rate_limit)?,
            retry: RetryExecutor::new(retry_policy, provider),
            backend,
            fallback,
            synthesizer: FallbackSynthesizer::new(),
        })
    }

    /// A client that always answers from the offline synthesizer.
    pub fn offline() -> Self {
        Self {
            backend: None,
            limiter: RateLimiter::disabled(),
            retry: RetryExecutor::new(RetryPolicy::default(), OFFLINE),
            fallback: FallbackPolicy::Always,
            synthesizer: FallbackSynthesizer::new(),
        }
    }

    /// Build the backend and resilience layers a configuration describes.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::ConfigurationError`] if the configuration fails
    /// validation.
    pub fn from_config(config: &GeneratorConfig) -> GenResult<Self> {
        config.validate()?;

        let backend = config.backend.as_ref().map(build_backend).transpose()?;
        let retry_policy = config
            .backend
            .as_ref()
            .map(BackendConfig::provider)
            .map(|provider| provider.retry_policy().clone())
            .unwrap_or_default();

        Self::new(
            backend,
            retry_policy,
            config.rate_limit.clone(),
            config.fallback,
        )
    }

    pub fn provider_name(&self) -> &'static str {
        self.backend
            .as_ref()
            .map_or(OFFLINE, |backend| backend.provider_name())
    }

    /// True when calls made with `options` would be answered offline.
    pub fn uses_fallback(&self, options: &InvokeOptions) -> bool {
        options.deterministic
            || self.fallback == FallbackPolicy::Always
            || (self.backend.is_none() && self.fallback == FallbackPolicy::WhenUnconfigured)
    }

    /// Send one prompt and return the raw response text.
    ///
    /// # Errors
    ///
    /// - [`GenError::ProviderUnavailable`] when retries are exhausted, or no
    ///   backend is configured and fallback is disabled
    /// - [`GenError::ProviderAuthFailure`] and [`GenError::MalformedRequest`]
    ///   immediately, without retrying
    pub async fn invoke(&self, prompt: &str, options: &InvokeOptions) -> GenResult<String> {
        if self.uses_fallback(options) {
            log_debug!(
                prompt_length = prompt.len(),
                deterministic = options.deterministic,
                "Answering from the offline synthesizer"
            );
            return Ok(self.synthesizer.synthesize(prompt));
        }

        let Some(backend) = self.backend.as_ref() else {
            return Err(GenError::provider_unavailable(
                OFFLINE,
                0,
                "no backend configured and fallback is disabled",
            ));
        };

        let limiter = &self.limiter;
        let response = self
            .retry
            .execute(move || async move {
                limiter.acquire().await?;
                backend.complete(prompt, options).await
            })
            .await?;

        log_info!(
            provider = backend.provider_name(),
            response_length = response.len(),
            "Backend call completed"
        );
        Ok(response)
    }
}
