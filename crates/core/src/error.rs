//! Error types shared across Lectern crates.
//!
//! Domain crates define their own narrow error enums for outcomes callers
//! must distinguish (not found, misconfigured, ...). `AppError` covers the
//! infrastructure failures underneath them.

use thiserror::Error;

/// Unified infrastructure error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Metadata store errors
    #[error("Database error: {0}")]
    Database(String),

    /// Credential and session errors
    #[error("Auth error: {0}")]
    Auth(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
