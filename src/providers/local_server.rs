//! Local model server backend (Ollama generate API)

use super::http::HttpTransport;
use super::{InvokeOptions, ProviderBackend};
use crate::config::{LocalServerConfig, ProviderConfig};
use crate::error::{GenError, GenResult};
use crate::logging::log_debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Talks to a model server on the local network; no credentials.
#[derive(Debug)]
pub struct LocalServerBackend {
    http: HttpTransport,
    config: LocalServerConfig,
}

impl LocalServerBackend {
    /// # Errors
    ///
    /// Returns [`GenError::ConfigurationError`] if the base URL or model is
    /// blank.
    pub fn new(config: LocalServerConfig) -> GenResult<Self> {
        config.validate()?;

        log_debug!(
            provider = "local-server",
            base_url = %config.base_url,
            model = %config.default_model,
            "Local server backend initialized"
        );

        Ok(Self {
            http: HttpTransport::new(),
            config,
        })
    }

    pub fn config(&self) -> &LocalServerConfig {
        &self.config
    }
}

#[async_trait]
impl ProviderBackend for LocalServerBackend {
    fn provider_name(&self) -> &'static str {
        "local-server"
    }

    async fn complete(&self, prompt: &str, options: &InvokeOptions) -> GenResult<String> {
        let request = GenerateRequest {
            model: &self.config.default_model,
            prompt,
            system: options.system_prompt.as_deref(),
            stream: false,
            options: GenerateOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let body = self
            .http
            .post_json(&self.config.endpoint_url(), None, &request)
            .await?;

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            GenError::response_parsing_error(format!("Unexpected local server response: {e}"))
        })?;
        Ok(parsed.response)
    }
}
