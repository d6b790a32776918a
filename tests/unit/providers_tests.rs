/*!
 * Tests for provider clients, the config-driven factory and client caching
 */

use pdftrans::app_config::{TranslationConfig, TranslationProvider as ProviderKind};
use pdftrans::errors::ProviderError;
use pdftrans::providers::google::GoogleTranslate;
use pdftrans::providers::hosted::{ChatResponse, HostedInference};
use pdftrans::providers::mock::MockProvider;
use pdftrans::providers::ollama::Ollama;
use pdftrans::providers::{ConfigProviderFactory, ProviderFactory, TranslationProvider, prompt};
use serde_json::json;
use std::time::Duration;

use crate::common;

#[tokio::test]
async fn test_mockProvider_shouldRecordEveryRequest() {
    let provider = MockProvider::working();

    provider.translate("open", "en", "hi").await.unwrap();
    provider.translate("close", "en", "hi").await.unwrap();

    let requests = provider.requests();
    assert_eq!(provider.call_count(), 2);
    assert_eq!(requests[0].text, "open");
    assert_eq!(requests[1].target_language, "hi");
}

#[tokio::test]
async fn test_intermittentProvider_shouldFailEveryNthCall() {
    let provider = MockProvider::intermittent(2);

    assert!(provider.translate("a", "en", "hi").await.is_ok());
    assert!(provider.translate("b", "en", "hi").await.is_err());
    assert!(provider.translate("c", "en", "hi").await.is_ok());
}

#[test]
fn test_googleParseResponse_shouldConcatenateChunks() {
    let body = json!([[["नमस्ते ", "Hello ", null], ["दुनिया", "world", null]], null, "en"]);

    let text = GoogleTranslate::parse_response(&body).unwrap();

    assert_eq!(text, "नमस्ते दुनिया");
}

#[test]
fn test_googleParseResponse_withBlankChunks_shouldBeEmptyResponse() {
    let body = json!([[["  ", "Hello", null]]]);

    assert!(matches!(
        GoogleTranslate::parse_response(&body),
        Err(ProviderError::EmptyResponse)
    ));
}

#[test]
fn test_googleRequestUrl_shouldCarryLanguagePair() {
    let client = GoogleTranslate::new(
        "https://translate.googleapis.com/translate_a/single",
        Duration::from_secs(5),
    )
    .unwrap();

    let url = client.request_url("Hello world", "en", "hi");
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    assert!(pairs.contains(&("sl".to_string(), "en".to_string())));
    assert!(pairs.contains(&("tl".to_string(), "hi".to_string())));
    assert!(pairs.contains(&("q".to_string(), "Hello world".to_string())));
}

#[test]
fn test_hostedExtractText_shouldDropEchoedLabel() {
    let response: ChatResponse = serde_json::from_value(json!({
        "choices": [{ "message": { "role": "assistant", "content": "Hindi: नमस्ते" } }]
    }))
    .unwrap();

    assert_eq!(HostedInference::extract_text(&response, "hi").unwrap(), "नमस्ते");
}

#[test]
fn test_hostedExtractText_withLabelOnly_shouldBeEmptyResponse() {
    let response: ChatResponse = serde_json::from_value(json!({
        "choices": [{ "message": { "role": "assistant", "content": "Hindi:" } }]
    }))
    .unwrap();

    assert!(matches!(
        HostedInference::extract_text(&response, "hi"),
        Err(ProviderError::EmptyResponse)
    ));
}

#[test]
fn test_ollamaParseResponse_withStreamedLines_shouldJoinText() {
    let body = "{\"model\":\"m\",\"response\":\"नम\",\"done\":false}\n{\"model\":\"m\",\"response\":\"स्ते\",\"done\":true}\n";

    let parsed = Ollama::parse_response(body).unwrap();

    assert_eq!(parsed.response, "नमस्ते");
    assert!(parsed.done);
}

#[test]
fn test_buildPrompt_shouldEmbedTextAndPlaceholderRule() {
    let text = prompt::build_prompt("Open __PT0__ now", "en", "hi");

    assert!(text.contains("English: Open __PT0__ now"));
    assert!(text.contains("__PT0__ exactly as written"));
    assert!(text.trim_end().ends_with("Hindi:"));
}

#[test]
fn test_configFactory_shouldBuildSelectedProvider() {
    let mut config = TranslationConfig::default();

    config.provider = ProviderKind::Mock;
    let mock = ConfigProviderFactory::new(config.clone()).create("en", "hi").unwrap();
    assert_eq!(mock.name(), "Mock");

    config.provider = ProviderKind::Google;
    let google = ConfigProviderFactory::new(config.clone()).create("en", "hi").unwrap();
    assert_eq!(google.name(), "Google Translate");

    config.provider = ProviderKind::Ollama;
    let ollama = ConfigProviderFactory::new(config).create("hi", "en").unwrap();
    assert_eq!(ollama.name(), "Ollama");
}

#[tokio::test]
async fn test_orchestratorCache_shouldReuseClientPerPair() {
    let orchestrator = common::mock_orchestrator(MockProvider::working());

    orchestrator.translate_block("first", "en", "hi").await;
    orchestrator.translate_block("second", "en", "hi").await;
    orchestrator.translate_block("third", "hi", "en").await;

    let (hits, misses, _) = orchestrator.cache().stats();
    assert_eq!(orchestrator.cache().len(), 2);
    assert_eq!(misses, 2);
    assert_eq!(hits, 1);
}
