//! HTTP chat completion provider.

use std::time::Duration;

use plan_core::{async_trait, AiError, ChatMessage, CompletionProvider};
use reqwest::Client;
use tracing::{debug, info};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::AiProviderConfig;

/// A [`CompletionProvider`] that talks to an OpenAI-compatible
/// `/v1/chat/completions` endpoint.
pub struct HttpCompletionProvider {
    client: Client,
    config: AiProviderConfig,
}

impl HttpCompletionProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: AiProviderConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AiError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "AI provider '{}' initialized with model: {} at {}",
            config.name, config.model, config.api_url
        );

        Ok(Self { client, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &AiProviderConfig {
        &self.config
    }

    fn provider_error(&self, message: impl Into<String>) -> AiError {
        AiError::Provider {
            provider: self.config.name.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiError> {
        if self.config.api_key.trim().is_empty() {
            return Err(AiError::Configuration(format!(
                "API key for AI provider '{}' not set",
                self.config.name
            )));
        }

        let url = format!("{}/v1/chat/completions", self.config.api_url.trim_end_matches('/'));

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(
            "Sending {} messages to '{}' ({})",
            request.messages.len(),
            self.config.name,
            request.model
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AiError::Network(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            // Try to parse as API error
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&text) {
                return Err(self.provider_error(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    api_error.error.message()
                )));
            }

            return Err(self.provider_error(format!("API error ({}): {}", status.as_u16(), text)));
        }

        // Some gateways answer 200 with an error object.
        if let Ok(api_error) = serde_json::from_str::<ApiError>(&text) {
            return Err(self.provider_error(api_error.error.message().to_string()));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| AiError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(ref usage) = completion.usage {
            debug!(
                "'{}' usage: {} prompt + {} completion = {} tokens",
                self.config.name, usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        if let Some(reason) = completion.choices.first().and_then(|c| c.finish_reason.as_deref()) {
            if reason == "length" {
                debug!("'{}' stopped at the token limit", self.config.name);
            }
        }

        completion
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| AiError::MalformedResponse("response has no content".to_string()))
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
