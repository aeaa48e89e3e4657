//! Error types for Scarbot.
//!
//! This module defines a unified error enum covering the conversation core
//! (templates, retrieval, generation, session invariants) and the ambient
//! concerns around it (configuration, I/O, serialization).

use thiserror::Error;

/// Unified error type for Scarbot.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Dependency failures are surfaced to the caller, never papered over with a
/// fabricated answer.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required template slot was not supplied, or rendering failed
    #[error("Template error: {0}")]
    Template(String),

    /// The retrieval capability failed (transport/backend fault, not "no matches")
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// The language-model capability failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// A follow-up was requested but the transcript holds no user message
    #[error("No user turn found in the conversation log")]
    NoUserTurnFound,

    /// A session operation was invoked in the wrong phase
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

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
