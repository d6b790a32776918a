use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Supported translation directions
    #[serde(default = "default_directions")]
    pub directions: Vec<TranslationDirection>,

    /// Translation config
    pub translation: TranslationConfig,

    /// Output rendering config
    #[serde(default)]
    pub rendering: RenderingConfig,

    /// Post-translation replacements, applied per target language
    #[serde(default = "default_modern_fixes")]
    pub modern_fixes: Vec<ModernFixRule>,

    /// Largest accepted input file in megabytes
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// A named, supported (source, target) pair
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationDirection {
    /// Human readable label, e.g. "Hindi to English"
    pub label: String,
    /// Source language code
    pub source: String,
    /// Target language code
    pub target: String,
}

impl TranslationDirection {
    pub fn new(label: &str, source: &str, target: &str) -> Self {
        Self {
            label: label.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// One deterministic replacement applied to translated text
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModernFixRule {
    /// Target language the rule applies to, or "*" for every language
    #[serde(default = "default_fix_target")]
    pub target: String,
    /// Text to look for
    pub from: String,
    /// Replacement text
    pub to: String,
}

impl ModernFixRule {
    pub fn new(target: &str, from: &str, to: &str) -> Self {
        Self {
            target: target.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Google Translate web endpoint
    #[default]
    Google,
    // @provider: OpenAI-compatible hosted inference (Hugging Face router by default)
    Hosted,
    // @provider: Ollama
    Ollama,
    // @provider: Offline mock, useful for dry runs
    Mock,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google Translate",
            Self::Hosted => "Hosted Inference",
            Self::Ollama => "Ollama",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::Hosted => "hosted".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "hosted" | "huggingface" | "hf" => Ok(Self::Hosted),
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key (falls back to the provider's environment variable)
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        let (model, endpoint) = match provider_type {
            TranslationProvider::Google => (String::new(), default_google_endpoint()),
            TranslationProvider::Hosted => (default_hosted_model(), default_hosted_endpoint()),
            TranslationProvider::Ollama => (default_ollama_model(), default_ollama_endpoint()),
            TranslationProvider::Mock => (String::new(), String::new()),
        };

        Self {
            provider_type: provider_type.to_lowercase_string(),
            model,
            api_key: String::new(),
            endpoint,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default = "default_available_providers")]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: default_available_providers(),
            common: TranslationCommonConfig::default(),
        }
    }
}

impl TranslationConfig {
    /// Settings of the active provider, or its defaults when it is not listed
    pub fn active_provider_config(&self) -> ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
            .cloned()
            .unwrap_or_else(|| ProviderConfig::new(self.provider.clone()))
    }

    /// Model name of the active provider
    pub fn get_model(&self) -> String {
        self.active_provider_config().model
    }
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Provider attempts per segment before the source text is kept
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between two attempts for the same segment (in milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Pause between consecutive blocks (in milliseconds)
    #[serde(default = "default_block_delay_ms")]
    pub block_delay_ms: u64,

    /// Temperature parameter for prompt-based providers (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token cap for prompt-based providers
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            block_delay_ms: default_block_delay_ms(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Output rendering settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RenderingConfig {
    /// Put translated content into a toggleable optional content group
    #[serde(default = "default_true")]
    pub ocg_layer: bool,

    /// Name of the optional content group
    #[serde(default = "default_layer_name")]
    pub layer_name: String,

    /// Font size used when a block carries no size
    #[serde(default = "default_font_size")]
    pub default_font_size: f32,

    /// Extra points added below each cleared block box
    #[serde(default = "default_box_bottom_margin")]
    pub box_bottom_margin: f32,

    /// Page margin of the reflow writer
    #[serde(default = "default_reflow_margin")]
    pub reflow_margin: f32,

    /// Line height of the reflow writer
    #[serde(default = "default_reflow_line_height")]
    pub reflow_line_height: f32,

    /// TrueType font embedded for translated text; base-14 Helvetica when unset
    #[serde(default)]
    pub font_path: Option<String>,

    /// Search the system font folders when the target script needs a
    /// Unicode font and `font_path` is unset
    #[serde(default = "default_true")]
    pub system_fonts: bool,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            ocg_layer: true,
            layer_name: default_layer_name(),
            default_font_size: default_font_size(),
            box_bottom_margin: default_box_bottom_margin(),
            reflow_margin: default_reflow_margin(),
            reflow_line_height: default_reflow_line_height(),
            font_path: None,
            system_fonts: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            target_language: "hi".to_string(),
            directions: default_directions(),
            translation: TranslationConfig::default(),
            rendering: RenderingConfig::default(),
            modern_fixes: default_modern_fixes(),
            max_file_size_mb: default_max_file_size_mb(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Check that the languages are valid and form a supported direction
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_language_code(&self.source_language)
            .map_err(|e| anyhow!("Invalid source language: {}", e))?;
        language_utils::validate_language_code(&self.target_language)
            .map_err(|e| anyhow!("Invalid target language: {}", e))?;

        for direction in &self.directions {
            language_utils::validate_language_code(&direction.source)
                .map_err(|e| anyhow!("Invalid direction '{}': {}", direction.label, e))?;
            language_utils::validate_language_code(&direction.target)
                .map_err(|e| anyhow!("Invalid direction '{}': {}", direction.label, e))?;
        }

        if !self.is_supported_direction(&self.source_language, &self.target_language) {
            return Err(anyhow!(
                "Unsupported language direction: {} → {}",
                self.source_language,
                self.target_language
            ));
        }

        if self.translation.common.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be at least 1"));
        }

        if self.max_file_size_mb == 0 {
            return Err(anyhow!("max_file_size_mb must be greater than 0"));
        }

        Ok(())
    }

    /// Whether `(source, target)` is listed; identical languages are always accepted
    pub fn is_supported_direction(&self, source: &str, target: &str) -> bool {
        if language_utils::language_codes_match(source, target) {
            return true;
        }
        self.directions.iter().any(|d| {
            language_utils::language_codes_match(&d.source, source)
                && language_utils::language_codes_match(&d.target, target)
        })
    }

    /// Look up a direction by its label, ignoring case
    pub fn find_direction(&self, label: &str) -> Option<&TranslationDirection> {
        self.directions
            .iter()
            .find(|d| d.label.eq_ignore_ascii_case(label.trim()))
    }

    /// Upload limit in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

fn default_directions() -> Vec<TranslationDirection> {
    vec![
        TranslationDirection::new("Hindi to English", "hi", "en"),
        TranslationDirection::new("English to Hindi", "en", "hi"),
    ]
}

fn default_modern_fixes() -> Vec<ModernFixRule> {
    vec![
        ModernFixRule::new("hi", "संगणक", "कंप्यूटर"),
        ModernFixRule::new("hi", "अंतर्जाल", "इंटरनेट"),
        ModernFixRule::new("hi", "दूरभाष", "फ़ोन"),
        ModernFixRule::new("hi", "चलभाष", "मोबाइल"),
        ModernFixRule::new("hi", "ई-पत्र", "ईमेल"),
        ModernFixRule::new("hi", " ।", "।"),
        ModernFixRule::new("*", " ,", ","),
    ]
}

fn default_available_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(TranslationProvider::Google),
        ProviderConfig::new(TranslationProvider::Hosted),
        ProviderConfig::new(TranslationProvider::Ollama),
    ]
}

fn default_fix_target() -> String {
    "*".to_string()
}

fn default_max_file_size_mb() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_block_delay_ms() -> u64 {
    100
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_layer_name() -> String {
    "Translated".to_string()
}

fn default_font_size() -> f32 {
    12.0
}

fn default_box_bottom_margin() -> f32 {
    10.0
}

fn default_reflow_margin() -> f32 {
    50.0
}

fn default_reflow_line_height() -> f32 {
    16.0
}

fn default_google_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

fn default_hosted_model() -> String {
    "meta-llama/Meta-Llama-3.1-8B-Instruct".to_string()
}

fn default_hosted_endpoint() -> String {
    "https://router.huggingface.co/v1".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}
