/*!
 * Error types for the pdftrans application.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors raised while reading or writing PDF documents
#[derive(Error, Debug)]
pub enum PdfError {
    /// Input bytes are not an openable PDF document
    #[error("Invalid PDF document: {0}")]
    DocumentFormat(String),

    /// Document opened fine but contains no extractable text
    #[error("Document contains no extractable text")]
    EmptyContent,

    /// The translated layout could not be written back into the document
    #[error("Layout rewrite failed: {0}")]
    LayoutRewrite(String),
}

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider answered but the answer carried no text
    #[error("Provider returned an empty translation")]
    EmptyResponse,
}

impl ProviderError {
    /// Map a non-success HTTP status to the matching variant
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The requested direction is not in the supported table
    #[error("Unsupported language direction: {source_language} → {target_language}")]
    UnsupportedLanguagePair {
        source_language: String,
        target_language: String,
    },

    /// Translation was stopped through a cancellation token
    #[error("Translation cancelled after {completed} of {total} blocks")]
    Cancelled { completed: usize, total: usize },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Input file exceeds the configured upload limit
    #[error("File size {size_mb:.1}MB exceeds {limit_mb}MB limit")]
    FileTooLarge { size_mb: f64, limit_mb: u64 },

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from PDF processing
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Short message suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::FileTooLarge { limit_mb, .. } => {
                format!("File size exceeds {}MB limit", limit_mb)
            }
            Self::Pdf(PdfError::DocumentFormat(_)) => "Please upload a valid PDF file".to_string(),
            Self::Pdf(PdfError::EmptyContent) => {
                "The uploaded PDF appears to be empty or contains no extractable text".to_string()
            }
            Self::Pdf(PdfError::LayoutRewrite(_)) => {
                "Failed to generate translated PDF".to_string()
            }
            Self::Translation(TranslationError::UnsupportedLanguagePair {
                source_language,
                target_language,
            }) => format!(
                "[Error: Unsupported language direction: {} → {}]",
                source_language, target_language
            ),
            Self::Translation(_) | Self::Provider(_) => {
                "Translation failed. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
