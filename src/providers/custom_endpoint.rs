//! User-defined HTTP endpoint backend
//!
//! Posts `{prompt, temperature, max_tokens, model?}` and accepts any of
//! `response`, `text` or `content` in a JSON reply. A reply that is not JSON
//! at all is taken as the model text itself.

use super::http::HttpTransport;
use super::{InvokeOptions, ProviderBackend};
use crate::config::{CustomEndpointConfig, ProviderConfig};
use crate::error::{GenError, GenResult};
use crate::logging::{log_debug, log_warn};

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct EndpointRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

const TEXT_FIELDS: [&str; 3] = ["response", "text", "content"];

#[derive(Debug)]
pub struct CustomEndpointBackend {
    http: HttpTransport,
    config: CustomEndpointConfig,
}

impl CustomEndpointBackend {
    /// # Errors
    ///
    /// Returns [`GenError::ConfigurationError`] if the endpoint URL is blank.
    pub fn new(config: CustomEndpointConfig) -> GenResult<Self> {
        config.validate()?;

        log_debug!(
            provider = "custom-endpoint",
            base_url = %config.base_url,
            has_api_key = config.api_key.is_some(),
            "Custom endpoint backend initialized"
        );

        Ok(Self {
            http: HttpTransport::new(),
            config,
        })
    }

    pub fn config(&self) -> &CustomEndpointConfig {
        &self.config
    }
}

fn extract_text(body: &str) -> GenResult<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Ok(body.to_string());
    };

    match value {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Object(map) => TEXT_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(|v| v.as_str()))
            .map(str::to_string)
            .ok_or_else(|| {
                log_warn!(
                    fields = ?map.keys().collect::<Vec<_>>(),
                    "Custom endpoint reply has no text field"
                );
                GenError::response_parsing_error(
                    "Custom endpoint reply has none of: response, text, content",
                )
            }),
        _ => Ok(body.to_string()),
    }
}

#[async_trait]
impl ProviderBackend for CustomEndpointBackend {
    fn provider_name(&self) -> &'static str {
        "custom-endpoint"
    }

    async fn complete(&self, prompt: &str, options: &InvokeOptions) -> GenResult<String> {
        let request = EndpointRequest {
            prompt,
            system: options.system_prompt.as_deref(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            model: self.config.model.as_deref(),
        };

        let body = self
            .http
            .post_json(&self.config.endpoint_url(), self.config.api_key(), &request)
            .await?;

        extract_text(&body)
    }
}
