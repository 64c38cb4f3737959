//! Error types for the streaming core

use thiserror::Error;

/// Streaming core error types
#[derive(Error, Debug)]
pub enum AiError {
    #[error("inference backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("inference backend did not respond within {0} seconds")]
    Timeout(u64),

    #[error("inference backend error: {0}")]
    Backend(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for streaming core operations
pub type Result<T> = std::result::Result<T, AiError>;
