//! Backend and generator configuration.
//!
//! Endpoint URLs and credentials are opaque strings: validation checks that
//! required values are present, never that they are correct.

use crate::error::{GenError, GenResult};
use crate::internals::retry::RetryPolicy;
use crate::logging::log_debug;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

/// Trait for backend-specific configuration
pub trait ProviderConfig: Send + Sync + Debug {
    /// Get the backend name
    fn provider_name(&self) -> &'static str;

    /// Validate backend configuration
    ///
    /// # Errors
    ///
    /// Returns [`GenError::ConfigurationError`] if a required value (URL,
    /// API key) is missing or blank.
    fn validate(&self) -> GenResult<()>;

    /// Get the base URL for API calls
    fn base_url(&self) -> &str;

    /// Full URL requests are posted to
    fn endpoint_url(&self) -> String;

    /// Get the API key if one is configured
    fn api_key(&self) -> Option<&str>;

    /// Get the model name, empty when the backend picks one itself
    fn default_model(&self) -> &str;

    /// Get the retry policy for this backend
    fn retry_policy(&self) -> &RetryPolicy;
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

fn require(value: &str, what: &str) -> GenResult<()> {
    if value.trim().is_empty() {
        return Err(GenError::configuration_error(format!("{what} is required")));
    }
    Ok(())
}

/// Local model server speaking the Ollama generate API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalServerConfig {
    pub base_url: String,
    pub default_model: String,
    pub retry_policy: RetryPolicy,
}

impl Default for LocalServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            default_model: "llama3".to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl ProviderConfig for LocalServerConfig {
    fn provider_name(&self) -> &'static str {
        "local-server"
    }

    fn validate(&self) -> GenResult<()> {
        require(&self.base_url, "Local server base URL")?;
        require(&self.default_model, "Local server model")
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self) -> String {
        join_url(&self.base_url, "/api/generate")
    }

    fn api_key(&self) -> Option<&str> {
        None
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

/// Hosted OpenAI-compatible chat completion API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedApiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub retry_policy: RetryPolicy,
}

impl Default for HostedApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl ProviderConfig for HostedApiConfig {
    fn provider_name(&self) -> &'static str {
        "hosted-api"
    }

    fn validate(&self) -> GenResult<()> {
        require(self.api_key.as_deref().unwrap_or_default(), "Hosted API key")?;
        require(&self.base_url, "Hosted API base URL")
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self) -> String {
        join_url(&self.base_url, "/v1/chat/completions")
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

/// User-defined HTTP endpoint accepting `{prompt, ...}` on `/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEndpointConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub retry_policy: RetryPolicy,
}

impl Default for CustomEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            model: None,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl ProviderConfig for CustomEndpointConfig {
    fn provider_name(&self) -> &'static str {
        "custom-endpoint"
    }

    fn validate(&self) -> GenResult<()> {
        require(&self.base_url, "Custom endpoint URL")
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self) -> String {
        join_url(&self.base_url, "/generate")
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn default_model(&self) -> &str {
        self.model.as_deref().unwrap_or_default()
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

/// The backend a [`ProviderClient`](crate::client::ProviderClient) talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BackendConfig {
    LocalServer(LocalServerConfig),
    HostedApi(HostedApiConfig),
    CustomEndpoint(CustomEndpointConfig),
}

impl BackendConfig {
    pub fn provider(&self) -> &dyn ProviderConfig {
        match self {
            Self::LocalServer(config) => config,
            Self::HostedApi(config) => config,
            Self::CustomEndpoint(config) => config,
        }
    }
}

/// Token bucket settings, one bucket per client instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    /// Calls allowed back to back before spacing applies
    pub burst_size: u32,
    /// Longest a call waits for a token before failing with a timeout
    pub max_wait: Duration,
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 1.0,
            burst_size: 1,
            max_wait: Duration::from_secs(30),
            enabled: true,
        }
    }
}

impl RateLimitConfig {
    pub fn per_second(requests_per_second: f64) -> Self {
        Self {
            requests_per_second,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> GenResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if !self.requests_per_second.is_finite() || self.requests_per_second <= 0.0 {
            return Err(GenError::configuration_error(format!(
                "requests_per_second must be positive, got {}",
                self.requests_per_second
            )));
        }
        if self.burst_size == 0 {
            return Err(GenError::configuration_error("burst_size must be at least 1"));
        }
        Ok(())
    }
}

/// When the deterministic offline generator answers instead of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Never; a missing backend is `ProviderUnavailable`.
    Disabled,
    /// Only when no backend is configured.
    #[default]
    WhenUnconfigured,
    /// Always, even when a backend is configured.
    Always,
}

/// Everything needed to build a client and run the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub backend: Option<BackendConfig>,
    pub rate_limit: RateLimitConfig,
    pub fallback: FallbackPolicy,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Bounds the whole multi-type fan-out
    pub fan_out_timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: None,
            rate_limit: RateLimitConfig::default(),
            fallback: FallbackPolicy::default(),
            temperature: 0.3,
            max_tokens: 2000,
            fan_out_timeout: Duration::from_secs(120),
        }
    }
}

impl GeneratorConfig {
    /// Configuration that never touches the network.
    pub fn offline() -> Self {
        Self {
            fallback: FallbackPolicy::Always,
            ..Self::default()
        }
    }

    pub fn with_backend(backend: BackendConfig) -> Self {
        Self {
            backend: Some(backend),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> GenResult<()> {
        if let Some(backend) = &self.backend {
            backend.provider().validate()?;
        }
        self.rate_limit.validate()?;
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GenError::configuration_error(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    /// Create a backend configuration by name
    ///
    /// # Errors
    ///
    /// Returns [`GenError::ConfigurationError`] if the name is not one of
    /// `ollama`/`local-server`, `openai`/`hosted-api`, `custom`/`custom-endpoint`,
    /// or the resulting configuration fails validation.
    pub fn create_backend(
        provider_name: &str,
        api_key: Option<String>,
        base_url: Option<String>,
        model: Option<String>,
    ) -> GenResult<BackendConfig> {
        log_debug!(
            provider = %provider_name,
            has_api_key = api_key.is_some(),
            has_base_url = base_url.is_some(),
            has_model = model.is_some(),
            "Creating backend configuration"
        );

        let backend = match provider_name.trim().to_ascii_lowercase().as_str() {
            "ollama" | "local" | "local-server" => {
                let mut config = LocalServerConfig::default();
                if let Some(url) = base_url {
                    config.base_url = url;
                }
                if let Some(m) = model {
                    config.default_model = m;
                }
                BackendConfig::LocalServer(config)
            }
            "openai" | "hosted" | "hosted-api" => {
                let mut config = HostedApiConfig {
                    api_key,
                    ..HostedApiConfig::default()
                };
                if let Some(url) = base_url {
                    config.base_url = url;
                }
                if let Some(m) = model {
                    config.default_model = m;
                }
                BackendConfig::HostedApi(config)
            }
            "custom" | "custom-endpoint" | "endpoint" => {
                BackendConfig::CustomEndpoint(CustomEndpointConfig {
                    base_url: base_url.unwrap_or_default(),
                    api_key,
                    model,
                    retry_policy: RetryPolicy::default(),
                })
            }
            _ => {
                return Err(GenError::configuration_error(format!(
                    "Unsupported provider: {provider_name}. Supported providers: ollama, openai, custom"
                )));
            }
        };

        backend.provider().validate()?;
        Ok(backend)
    }

    /// Load configuration from environment variables
    /// This is the ONLY method that should access environment variables
    ///
    /// `TESTGEN_PROVIDER` selects `ollama`, `openai`, `custom` or `offline`
    /// (the default).
    ///
    /// # Errors
    ///
    /// Returns [`GenError::ConfigurationError`] if the provider is unknown, a
    /// required variable is missing, or `TESTGEN_RATE_PER_SECOND` is not a
    /// positive number.
    pub fn from_env() -> GenResult<Self> {
        let provider_name =
            std::env::var("TESTGEN_PROVIDER").unwrap_or_else(|_| "offline".to_string());
        let model = std::env::var("TESTGEN_MODEL").ok();

        log_debug!(
            target_provider = %provider_name,
            "Loading generator configuration from environment"
        );

        let mut config = match provider_name.trim().to_ascii_lowercase().as_str() {
            "offline" | "none" | "" => Self::offline(),
            "ollama" | "local" | "local-server" => Self::with_backend(Self::create_backend(
                "ollama",
                None,
                std::env::var("OLLAMA_BASE_URL").ok(),
                model,
            )?),
            "openai" | "hosted" | "hosted-api" => Self::with_backend(Self::create_backend(
                "openai",
                std::env::var("OPENAI_API_KEY").ok(),
                std::env::var("OPENAI_BASE_URL").ok(),
                model,
            )?),
            "custom" | "custom-endpoint" | "endpoint" => Self::with_backend(Self::create_backend(
                "custom",
                std::env::var("TESTGEN_ENDPOINT_KEY").ok(),
                std::env::var("TESTGEN_ENDPOINT_URL").ok(),
                model,
            )?),
            other => {
                return Err(GenError::configuration_error(format!(
                    "Unsupported provider: {other}. Supported providers: ollama, openai, custom, offline"
                )));
            }
        };

        if let Ok(rate) = std::env::var("TESTGEN_RATE_PER_SECOND") {
            config.rate_limit.requests_per_second = rate.trim().parse().map_err(|_| {
                GenError::configuration_error(format!(
                    "TESTGEN_RATE_PER_SECOND must be a number, got '{rate}'"
                ))
            })?;
        }

        config.validate()?;

        log_debug!(
            provider = config
                .backend
                .as_ref()
                .map_or("offline", |backend| backend.provider().provider_name()),
            requests_per_second = config.rate_limit.requests_per_second,
            fallback = ?config.fallback,
            "Generator configuration loaded and validated"
        );

        Ok(config)
    }
}
