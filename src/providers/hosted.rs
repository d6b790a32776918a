use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::TranslationProvider;
use crate::providers::prompt;

/// Environment variable read when the config carries no API key
pub const API_KEY_ENV: &str = "HF_TOKEN";

/// Client for an OpenAI-compatible chat completions endpoint
///
/// The default endpoint is the Hugging Face inference router; any server
/// exposing `POST {endpoint}/chat/completions` works.
#[derive(Debug, Clone)]
pub struct HostedInference {
    /// Base URL, without the `/chat/completions` suffix
    endpoint: String,
    /// Model identifier, e.g. `meta-llama/Meta-Llama-3.1-8B-Instruct`
    model: String,
    /// Bearer token; empty means no Authorization header
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    /// HTTP client for making requests
    client: Client,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user or assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Chat completion request body
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Chat completion response body
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

impl HostedInference {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self, ProviderError> {
        if model.trim().is_empty() {
            return Err(ProviderError::RequestFailed("No model configured".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.trim().to_string(),
            temperature,
            max_tokens,
            client,
        })
    }

    /// Build the request body for one segment
    pub fn build_request(&self, text: &str, source_language: &str, target_language: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt::build_prompt(text, source_language, target_language),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        }
    }

    /// First choice content with any echoed language label removed
    pub fn extract_text(response: &ChatResponse, target_language: &str) -> Result<String, ProviderError> {
        let content = response
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| ProviderError::ParseError("response has no choices".to_string()))?;

        let text = prompt::strip_label(content, target_language);
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl TranslationProvider for HostedInference {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = self.build_request(text, source_language, target_language);
        debug!("Hosted inference request to {} with model {}", url, self.model);

        let mut request = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::from_status(status.as_u16(), message));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Self::extract_text(&parsed, target_language)
    }

    fn name(&self) -> &str {
        "Hosted inference"
    }
}
