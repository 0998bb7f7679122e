//! Error types for verdict.

use thiserror::Error;

/// Result type for verdict operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for verdict operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid argument or input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A field read or write against a sample collection failed.
    #[error("Field error: {0}")]
    Field(String),

    /// Dataset loading/ingestion error.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Evaluation error.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a field error.
    pub fn field(msg: impl Into<String>) -> Self {
        Error::Field(msg.into())
    }

    /// Create a dataset error.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Error::Dataset(msg.into())
    }

    /// Create an evaluation error.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Error::Evaluation(msg.into())
    }
}
