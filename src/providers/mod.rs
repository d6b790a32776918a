/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the supported backends:
 * - Google: public Google Translate web endpoint
 * - Hosted: OpenAI-compatible chat completions (Hugging Face router by default)
 * - Ollama: Local LLM server
 * - Mock: deterministic provider for tests and dry runs
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{ProviderConfig, TranslationConfig, TranslationProvider as ProviderKind};
use crate::errors::ProviderError;

/// Common trait for all translation providers
///
/// Every backend maps `(text, source, target)` to translated text. Errors
/// and empty replies are treated as retryable by the orchestrator.
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Translate `text` from `source_language` to `target_language`
    ///
    /// # Arguments
    /// * `text` - Already trimmed and masked text
    /// * `source_language` - ISO code of the input
    /// * `target_language` - ISO code of the wanted output
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translation or an error
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Builds a provider client for one language pair
pub trait ProviderFactory: Send + Sync {
    fn create(
        &self,
        source_language: &str,
        target_language: &str,
    ) -> Result<Arc<dyn TranslationProvider>, ProviderError>;
}

impl<F> ProviderFactory for F
where
    F: Fn(&str, &str) -> Result<Arc<dyn TranslationProvider>, ProviderError> + Send + Sync,
{
    fn create(
        &self,
        source_language: &str,
        target_language: &str,
    ) -> Result<Arc<dyn TranslationProvider>, ProviderError> {
        self(source_language, target_language)
    }
}

/// Factory driven by the translation section of the configuration
#[derive(Debug, Clone)]
pub struct ConfigProviderFactory {
    config: TranslationConfig,
}

impl ConfigProviderFactory {
    pub fn new(config: TranslationConfig) -> Self {
        Self { config }
    }
}

impl ProviderFactory for ConfigProviderFactory {
    fn create(
        &self,
        source_language: &str,
        target_language: &str,
    ) -> Result<Arc<dyn TranslationProvider>, ProviderError> {
        let settings = self.config.active_provider_config();
        log::debug!(
            "Creating {} client for {} → {}",
            self.config.provider.display_name(),
            source_language,
            target_language
        );

        let provider: Arc<dyn TranslationProvider> = match self.config.provider {
            ProviderKind::Google => Arc::new(google::GoogleTranslate::new(
                &settings.endpoint,
                timeout(&settings),
            )?),
            ProviderKind::Hosted => Arc::new(hosted::HostedInference::new(
                &settings.endpoint,
                &settings.model,
                &resolve_api_key(&settings, hosted::API_KEY_ENV),
                timeout(&settings),
                self.config.common.temperature,
                self.config.common.max_tokens,
            )?),
            ProviderKind::Ollama => Arc::new(ollama::Ollama::new(
                &settings.endpoint,
                &settings.model,
                timeout(&settings),
                self.config.common.temperature,
            )?),
            ProviderKind::Mock => Arc::new(mock::MockProvider::working()),
        };

        Ok(provider)
    }
}

fn timeout(settings: &ProviderConfig) -> Duration {
    Duration::from_secs(settings.timeout_secs.max(1))
}

fn resolve_api_key(settings: &ProviderConfig, env_var: &str) -> String {
    if settings.api_key.trim().is_empty() {
        std::env::var(env_var).unwrap_or_default()
    } else {
        settings.api_key.clone()
    }
}

pub mod google;
pub mod hosted;
pub mod mock;
pub mod ollama;
pub mod prompt;
