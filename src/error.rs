//! Orbit Error Types
//!
//! Error handling shared by the configuration, storage and study layers.
//! The request dispatcher never surfaces these: it reduces every backend
//! failure to an absent response.

use thiserror::Error;

/// Main error type for Orbit operations
#[derive(Debug, Error)]
pub enum OrbitError {
    /// Configuration errors (invalid JSON, unreadable settings file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No Gemini API keys configured anywhere
    #[error("No API keys found. Set GEMINI_KEYS (comma-separated) or add `gemini_keys` to orbit.json")]
    NoCredentials,

    /// HTTP request failed
    #[error("Request failed: {0}")]
    Request(String),

    /// Response parsing failed
    #[error("Response error: {0}")]
    Response(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Remote or local document store failure
    #[error("Store error: {0}")]
    Store(String),

    /// The model's quiz output was not a usable question list
    #[error("Failed to parse quiz: {0}")]
    Quiz(String),

    /// User input rejected by a study operation
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for OrbitError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OrbitError::Timeout(err.to_string())
        } else if err.is_connect() {
            OrbitError::Request(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            OrbitError::Response(format!("Failed to decode response: {}", err))
        } else {
            OrbitError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for OrbitError {
    fn from(err: serde_json::Error) -> Self {
        OrbitError::Response(format!("JSON parsing error: {}", err))
    }
}

/// Result type alias for Orbit operations
pub type Result<T> = std::result::Result<T, OrbitError>;
