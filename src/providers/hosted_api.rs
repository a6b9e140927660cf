//! Hosted chat-completion backend (OpenAI-compatible)

use super::http::HttpTransport;
use super::{InvokeOptions, ProviderBackend};
use crate::config::{HostedApiConfig, ProviderConfig};
use crate::error::{GenError, GenResult};
use crate::logging::log_debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug)]
pub struct HostedApiBackend {
    http: HttpTransport,
    config: HostedApiConfig,
}

impl HostedApiBackend {
    /// # Errors
    ///
    /// Returns [`GenError::ConfigurationError`] if the API key or base URL is
    /// missing.
    pub fn new(config: HostedApiConfig) -> GenResult<Self> {
        config.validate()?;

        log_debug!(
            provider = "hosted-api",
            base_url = %config.base_url,
            model = %config.default_model,
            "Hosted API backend initialized"
        );

        Ok(Self {
            http: HttpTransport::new(),
            config,
        })
    }

    pub fn config(&self) -> &HostedApiConfig {
        &self.config
    }
}

#[async_trait]
impl ProviderBackend for HostedApiBackend {
    fn provider_name(&self) -> &'static str {
        "hosted-api"
    }

    async fn complete(&self, prompt: &str, options: &InvokeOptions) -> GenResult<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.config.default_model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let body = self
            .http
            .post_json(&self.config.endpoint_url(), self.config.api_key(), &request)
            .await?;

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            GenError::response_parsing_error(format!("Unexpected chat completion response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| GenError::response_parsing_error("Chat completion had no choices"))
    }
}
