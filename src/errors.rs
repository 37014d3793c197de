//! Error types for the IKMS question-answering pipeline
//!
//! Only backend failures and broken stage ordering are errors. Planner
//! parse problems and empty retrieval degrade to fallbacks instead.

use thiserror::Error;

/// Main error type for the question-answering pipeline
#[derive(Error, Debug)]
pub enum QaError {
    /// A stage update was applied out of order or twice
    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Chat/generation backend errors
    #[error("Generation backend error: {0}")]
    GenerationError(String),

    /// Embedding or vector search errors
    #[error("Retrieval backend error: {0}")]
    RetrievalError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("Pipeline error: {0}")]
    Generic(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, QaError>;

/// Convert anyhow errors to QaError
impl From<anyhow::Error> for QaError {
    fn from(err: anyhow::Error) -> Self {
        QaError::Generic(err.to_string())
    }
}
