use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::TranslationProvider;

/// Client for the public Google Translate web endpoint (`client=gtx`)
///
/// No API key is needed. The reply is a nested JSON array whose first
/// element lists `[translated, original, ...]` chunks, one per sentence.
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    /// Endpoint URL, normally `https://translate.googleapis.com/translate_a/single`
    endpoint: Url,
    /// HTTP client for making requests
    client: Client,
}

impl GoogleTranslate {
    /// Maximum characters the endpoint accepts in one query
    pub const MAX_CHARS: usize = 5000;

    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { endpoint, client })
    }

    /// Build the request URL for one query
    pub fn request_url(&self, text: &str, source_language: &str, target_language: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client", "gtx")
            .append_pair("sl", source_language)
            .append_pair("tl", target_language)
            .append_pair("dt", "t")
            .append_pair("q", text);
        url
    }

    /// Join the translated chunks of a `translate_a/single` reply
    pub fn parse_response(body: &Value) -> Result<String, ProviderError> {
        let chunks = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::ParseError("missing sentence array".to_string()))?;

        let translated: String = chunks
            .iter()
            .filter_map(|chunk| chunk.get(0).and_then(Value::as_str))
            .collect();

        if translated.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(translated)
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslate {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        if text.chars().count() > Self::MAX_CHARS {
            return Err(ProviderError::RequestFailed(format!(
                "Text exceeds maximum length of {} characters",
                Self::MAX_CHARS
            )));
        }

        let url = self.request_url(text, source_language, target_language);
        debug!("Google request: {} chars {} → {}", text.len(), source_language, target_language);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::from_status(status.as_u16(), message));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Self::parse_response(&body)
    }

    fn name(&self) -> &str {
        "Google Translate"
    }
}
