/*!
 * Block translation orchestration.
 *
 * Each block is segmented into translatable and protected runs. Protected
 * runs are copied through untouched. Translatable runs are trimmed, have
 * their embedded abbreviation-like tokens masked, and are sent to the
 * provider with a bounded number of attempts. The translated core is then
 * unmasked, post-processed with the modern-fixes table and wrapped in its
 * original whitespace again.
 *
 * Translation of a single block never fails: any segment that cannot be
 * translated keeps its source text. Only cancellation aborts a document.
 */

use log::{debug, error, info, warn};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, TranslationDirection};
use crate::errors::TranslationError;
use crate::language_utils::{self, DetectedLanguage};
use crate::providers::{ConfigProviderFactory, ProviderFactory, TranslationProvider};
use crate::translation::cache::ProviderCache;
use crate::translation::cancellation::CancellationToken;
use crate::translation::fixes::ModernFixes;
use crate::translation::masking;
use crate::translation::segmenter::{self, Segment};

/// Progress callback: fraction in `0.0..=1.0` and a status line
pub type ProgressFn<'a> = &'a (dyn Fn(f32, &str) + Send + Sync);

/// Attempt and pacing settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Provider calls per segment before the source text is kept
    pub max_attempts: u32,
    /// Pause between two attempts for the same segment
    pub retry_delay: Duration,
    /// Pause between consecutive blocks
    pub block_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
            block_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// No pauses at all; attempts stay bounded
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            retry_delay: Duration::ZERO,
            block_delay: Duration::ZERO,
        }
    }
}

/// Drives segment-level translation for whole documents
pub struct Orchestrator {
    factory: Arc<dyn ProviderFactory>,
    cache: ProviderCache,
    fixes: Arc<ModernFixes>,
    directions: Vec<TranslationDirection>,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Orchestrator with default pacing, the en↔hi directions and no fixes
    pub fn new(factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            factory,
            cache: ProviderCache::new(),
            fixes: Arc::new(ModernFixes::empty()),
            directions: Config::default().directions,
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Orchestrator wired from the application configuration
    pub fn from_config(config: &Config) -> Self {
        let common = &config.translation.common;
        let factory: Arc<dyn ProviderFactory> =
            Arc::new(ConfigProviderFactory::new(config.translation.clone()));

        Self::new(factory)
            .with_directions(config.directions.clone())
            .with_fixes(Arc::new(ModernFixes::new(config.modern_fixes.clone())))
            .with_retry_policy(RetryPolicy {
                max_attempts: common.max_attempts.max(1),
                retry_delay: Duration::from_millis(common.retry_delay_ms),
                block_delay: Duration::from_millis(common.block_delay_ms),
            })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            ..retry
        };
        self
    }

    pub fn with_directions(mut self, directions: Vec<TranslationDirection>) -> Self {
        self.directions = directions;
        self
    }

    pub fn with_fixes(mut self, fixes: Arc<ModernFixes>) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn cache(&self) -> &ProviderCache {
        &self.cache
    }

    /// Whether `(source, target)` is one of the configured directions
    pub fn supports(&self, source_language: &str, target_language: &str) -> bool {
        language_utils::language_codes_match(source_language, target_language)
            || self.directions.iter().any(|d| {
                language_utils::language_codes_match(&d.source, source_language)
                    && language_utils::language_codes_match(&d.target, target_language)
            })
    }

    /// Script-count language guess over the first 500 characters
    pub fn detect_language(&self, text: &str) -> DetectedLanguage {
        language_utils::detect_language(text)
    }

    /// Translate one block
    ///
    /// Returns the input unchanged for identical languages or blank text,
    /// and the unsupported-direction sentinel for pairs outside the
    /// configured directions.
    pub async fn translate_block(&self, text: &str, source_language: &str, target_language: &str) -> String {
        if text.trim().is_empty() || language_utils::language_codes_match(source_language, target_language) {
            return text.to_string();
        }

        if !self.supports(source_language, target_language) {
            warn!("Unsupported language direction: {} → {}", source_language, target_language);
            return unsupported_sentinel(source_language, target_language);
        }

        let provider = match self.cache.get_or_create(source_language, target_language, self.factory.as_ref()) {
            Ok(provider) => provider,
            Err(e) => {
                error!("Could not create provider for {} → {}: {}", source_language, target_language, e);
                return text.to_string();
            }
        };

        let mut output = String::with_capacity(text.len() * 2);
        for Segment { text: segment, translatable } in segmenter::segment(text) {
            if translatable {
                output.push_str(
                    &self
                        .translate_segment(provider.as_ref(), &segment, source_language, target_language)
                        .await,
                );
            } else {
                output.push_str(&segment);
            }
        }
        output
    }

    async fn translate_segment(
        &self,
        provider: &dyn TranslationProvider,
        segment: &str,
        source_language: &str,
        target_language: &str,
    ) -> String {
        let core = segment.trim();
        if core.is_empty() {
            return segment.to_string();
        }
        let (leading, rest) = segment.split_at(segment.len() - segment.trim_start().len());
        let trailing = &rest[rest.trim_end().len()..];

        let (masked, map) = masking::mask(core);
        let max_attempts = self.retry.max_attempts;
        let mut translated = None;

        for attempt in 1..=max_attempts {
            match provider.translate(&masked, source_language, target_language).await {
                Ok(reply) if !reply.trim().is_empty() => match map.unmask(reply.trim()) {
                    Some(unmasked) => {
                        translated = Some(unmasked);
                        break;
                    }
                    None => warn!(
                        "Attempt {}/{}: {} dropped a placeholder",
                        attempt,
                        max_attempts,
                        provider.name()
                    ),
                },
                Ok(_) => warn!("Attempt {}/{}: {} returned an empty reply", attempt, max_attempts, provider.name()),
                Err(e) => warn!("Attempt {}/{}: {} failed: {}", attempt, max_attempts, provider.name(), e),
            }

            if attempt < max_attempts {
                if self.cancel.is_cancelled() {
                    debug!("Cancelled while retrying segment");
                    break;
                }
                if !self.retry.retry_delay.is_zero() {
                    tokio::time::sleep(self.retry.retry_delay).await;
                }
            }
        }

        let core_out = match translated {
            Some(text) => self.fixes.apply(&text, target_language),
            None => {
                error!("Keeping source text after {} attempts: '{}'", max_attempts, truncate(core, 40));
                core.to_string()
            }
        };

        format!("{}{}{}", leading, core_out, trailing)
    }

    /// Translate every block in order
    ///
    /// The output has the same length and order as `texts`. The progress
    /// callback runs after each block; a panicking callback is logged and
    /// ignored.
    pub async fn translate_blocks(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<Vec<String>, TranslationError> {
        let total = texts.len();
        let mut results = Vec::with_capacity(total);
        info!("Translating {} blocks {} → {}", total, source_language, target_language);

        for (i, text) in texts.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!("Translation cancelled after {} of {} blocks", i, total);
                return Err(TranslationError::Cancelled { completed: i, total });
            }

            results.push(self.translate_block(text, source_language, target_language).await);

            if let Some(callback) = progress {
                let message = format!("Translating block {} of {}", i + 1, total);
                let fraction = (i + 1) as f32 / total as f32;
                if catch_unwind(AssertUnwindSafe(|| callback(fraction, &message))).is_err() {
                    warn!("Progress callback panicked; continuing");
                }
            }

            if i + 1 < total && !self.retry.block_delay.is_zero() {
                tokio::time::sleep(self.retry.block_delay).await;
            }
        }

        Ok(results)
    }
}

/// Text returned for a block whose direction is not configured
pub fn unsupported_sentinel(source_language: &str, target_language: &str) -> String {
    format!("[Error: Unsupported language direction: {} → {}]", source_language, target_language)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
