//! Error types for the snapshot pipeline

use thiserror::Error;

/// Pipeline-specific errors
#[derive(Debug, Error)]
pub enum LensError {
    /// Required credential or setting missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Ticker symbol failed validation before any fetch
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    /// Identity endpoint could not resolve the ticker to a known company
    #[error("No data found for ticker {0}")]
    TickerNotFound(String),

    /// Upstream endpoint returned a non-success HTTP status
    #[error("{endpoint} request failed with HTTP {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Completion call failed; callers surface this as a warning, never as a
    /// reason to withhold the numeric snapshot
    #[error("Narrative service error: {0}")]
    Narrative(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, LensError>;

/// Convert completion-layer errors into the narrative error kind
impl From<stocklens_llm::LlmError> for LensError {
    fn from(err: stocklens_llm::LlmError) -> Self {
        LensError::Narrative(err.to_string())
    }
}
