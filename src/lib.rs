/*!
 * # pdftrans - layout-aware PDF translation
 *
 * A Rust library that translates the text of PDF documents between English
 * and Hindi while keeping every block at its original position.
 *
 * ## Features
 *
 * - Positioned text block extraction from page content streams
 * - Protection of acronyms, identifiers, URLs and version strings
 * - Translation through pluggable providers:
 *   - Google Translate web endpoint
 *   - OpenAI-compatible hosted inference
 *   - Ollama (local LLM)
 * - Retry, progress reporting and cooperative cancellation
 * - In-place rewrite with an optional "Translated" layer, and a plain
 *   reflowed document when the layout cannot be rebuilt
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `pdf`: Document reading and writing:
 *   - `pdf::extractor`: Text blocks, document info and image listing
 *   - `pdf::rewriter`: Layout-preserving rewrite
 *   - `pdf::reflow`: Flowing-text fallback writer
 *   - `pdf::fonts`: Standard and embedded font support
 * - `translation`: Segmenting, masking, retries and post-fixes
 * - `providers`: Client implementations for the translation backends
 * - `file_utils`: File system operations
 * - `app_controller`: End-to-end pipeline and CLI driver
 * - `language_utils`: ISO language code utilities and script detection
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod pdf;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, PipelineOutput};
pub use errors::{AppError, PdfError, ProviderError, TranslationError};
pub use language_utils::{DetectedLanguage, detect_language, get_language_name, language_codes_match};
pub use pdf::{BBox, DocumentInfo, TextBlock, TextStyle};
pub use translation::{CancellationToken, Orchestrator};
