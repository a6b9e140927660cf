//! Generative-model backends
//!
//! Every backend implements [`ProviderBackend`]: one prompt in, raw model
//! text out. Retry, rate limiting and the offline fallback are layered on
//! top by [`ProviderClient`](crate::client::ProviderClient), so backends
//! only speak their wire protocol.
//!
//! ```text
//! http.rs            <- Shared JSON POST + status mapping
//!    |       |       |
//! local_server.rs  hosted_api.rs  custom_endpoint.rs
//!
//! fallback.rs        <- Deterministic, network-free synthesis
//! ```

pub mod custom_endpoint;
pub mod fallback;
pub mod http;
pub mod hosted_api;
pub mod local_server;

pub use custom_endpoint::CustomEndpointBackend;
pub use fallback::FallbackSynthesizer;
pub use hosted_api::HostedApiBackend;
pub use local_server::LocalServerBackend;

use crate::config::BackendConfig;
use crate::error::GenResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Per-call generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    /// Answer from the offline synthesizer even when a backend is configured
    pub deterministic: bool,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
            system_prompt: None,
            deterministic: false,
        }
    }
}

impl InvokeOptions {
    pub fn deterministic() -> Self {
        Self {
            deterministic: true,
            ..Self::default()
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// A generative-model backend speaking one wire protocol.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    /// Stable backend name used in logs and errors
    fn provider_name(&self) -> &'static str;

    /// Send one prompt and return the model's raw text.
    ///
    /// # Errors
    ///
    /// Returns the transport or protocol failure mapped onto [`GenError`](crate::error::GenError);
    /// transient failures report `is_retryable() == true`.
    async fn complete(&self, prompt: &str, options: &InvokeOptions) -> GenResult<String>;
}

/// Build the backend a configuration selects.
///
/// # Errors
///
/// Returns [`GenError::ConfigurationError`](crate::error::GenError::ConfigurationError)
/// if the configuration fails validation.
pub fn build_backend(config: &BackendConfig) -> GenResult<Arc<dyn ProviderBackend>> {
    let backend: Arc<dyn ProviderBackend> = match config {
        BackendConfig::LocalServer(c) => Arc::new(LocalServerBackend::new(c.clone())?),
        BackendConfig::HostedApi(c) => Arc::new(HostedApiBackend::new(c.clone())?),
        BackendConfig::CustomEndpoint(c) => Arc::new(CustomEndpointBackend::new(c.clone())?),
    };
    Ok(backend)
}
