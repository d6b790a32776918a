/*!
 * Tests for application configuration functionality
 */

use pdftrans::app_config::{Config, LogLevel, TranslationProvider};
use pdftrans::pdf::RewriteOptions;
use pdftrans::pdf::reflow::ReflowOptions;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "hi");
    assert_eq!(config.translation.provider, TranslationProvider::Google);
    assert_eq!(config.translation.common.max_attempts, 3);
    assert_eq!(config.translation.common.retry_delay_ms, 1000);
    assert_eq!(config.translation.common.block_delay_ms, 100);
    assert_eq!(config.max_file_size_mb, 10);
    assert_eq!(config.max_file_size_bytes(), 10 * 1024 * 1024);
    assert_eq!(config.log_level, LogLevel::Info);

    assert!(config.rendering.ocg_layer);
    assert_eq!(config.rendering.layer_name, "Translated");
    assert_eq!(config.rendering.box_bottom_margin, 10.0);
    assert_eq!(config.rendering.reflow_margin, 50.0);
    assert_eq!(config.rendering.reflow_line_height, 16.0);
    assert!(config.rendering.font_path.is_none());
    assert!(config.rendering.system_fonts);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.source_language = "zz".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translation.common.max_attempts = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.source_language = "hin".to_string();
    config.target_language = "eng".to_string();
    assert!(config.validate().is_ok());
}

/// Test JSON round trip of the default configuration
#[test]
fn test_config_serialization_withDefaultConfig_shouldRoundTrip() {
    let config = Config::default();

    let json = serde_json::to_string_pretty(&config).unwrap();
    let restored: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.source_language, config.source_language);
    assert_eq!(restored.directions, config.directions);
    assert_eq!(restored.modern_fixes.len(), config.modern_fixes.len());
    assert_eq!(restored.translation.provider, config.translation.provider);
    assert!(json.contains("\"provider\": \"google\""));
}

/// Test that the default fixes table targets Hindi vocabulary
#[test]
fn test_default_modernFixes_shouldReplaceDatedHindiTerms() {
    let config = Config::default();

    let computer = config
        .modern_fixes
        .iter()
        .find(|rule| rule.from == "संगणक")
        .expect("computer rule present");

    assert_eq!(computer.target, "hi");
    assert_eq!(computer.to, "कंप्यूटर");
}

/// Test that rendering settings flow into the writers
#[test]
fn test_renderingOptions_fromConfig_shouldCopySettings() {
    let mut config = Config::default();
    config.rendering.ocg_layer = false;
    config.rendering.reflow_margin = 36.0;
    config.rendering.font_path = Some("/fonts/Noto.ttf".to_string());

    let rewrite = RewriteOptions::from(&config.rendering);
    let reflow = ReflowOptions::from(&config.rendering);

    assert!(!rewrite.ocg_layer);
    assert_eq!(rewrite.layer_name, "Translated");
    assert_eq!(rewrite.font_path.as_deref(), Some("/fonts/Noto.ttf"));
    assert_eq!(reflow.margin, 36.0);
    assert_eq!(reflow.line_height, 16.0);
}

/// Test log level mapping
#[test]
fn test_logLevel_toLevelFilter_shouldMapEachLevel() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Debug.to_level_filter(), log::LevelFilter::Debug);
    let parsed: LogLevel = serde_json::from_str("\"trace\"").unwrap();
    assert_eq!(parsed, LogLevel::Trace);
}
