use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::TranslationProvider;
use crate::providers::prompt;

/// Ollama client for a local `/api/generate` endpoint
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// Model tag, e.g. `llama3.2:3b`
    model: String,
    /// Sampling temperature sent with every request
    temperature: f32,
    /// HTTP client for making requests
    client: Client,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: None,
            stream: false,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
        });
        self
    }
}

impl Ollama {
    /// Create a client for `endpoint`; a bare host gets `http://` prepended
    pub fn new(
        endpoint: &str,
        model: &str,
        timeout: Duration,
        temperature: f32,
    ) -> Result<Self, ProviderError> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        let base_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };

        let client = Client::builder()
            .timeout(timeout)
            // Ollama speaks HTTP/1.1
            .http1_only()
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            model: model.to_string(),
            temperature,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one non-streaming generation request
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::from_status(status.as_u16(), message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read Ollama response: {}", e)))?;

        Self::parse_response(&body)
    }

    /// Parse a single JSON object, or concatenate a JSONL stream when the
    /// server ignored `stream: false`
    pub fn parse_response(body: &str) -> Result<GenerationResponse, ProviderError> {
        match serde_json::from_str::<GenerationResponse>(body) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                let preview: String = body.chars().take(500).collect();
                error!("Failed to parse Ollama API response: {}. Raw response: {}", e, preview);

                let mut model = String::new();
                let mut text = String::new();
                let mut done = false;
                let mut parsed_any = false;
                for line in body.lines().filter(|l| !l.trim().is_empty()) {
                    if let Ok(chunk) = serde_json::from_str::<GenerationResponse>(line) {
                        parsed_any = true;
                        model = chunk.model;
                        text.push_str(&chunk.response);
                        done = chunk.done;
                    }
                }

                if parsed_any {
                    Ok(GenerationResponse {
                        model,
                        response: text,
                        done,
                    })
                } else {
                    Err(ProviderError::ParseError(e.to_string()))
                }
            }
        }
    }
}

#[async_trait]
impl TranslationProvider for Ollama {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let request = GenerationRequest::new(
            self.model.clone(),
            prompt::build_prompt(text, source_language, target_language),
        )
        .temperature(self.temperature);

        debug!("Ollama request to {} with model {}", self.base_url, self.model);
        let response = self.generate(request).await?;

        let translated = prompt::strip_label(&response.response, target_language);
        if translated.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(translated)
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}
