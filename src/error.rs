//! Error types for the eagleeye application.

use crate::agent::AgentError;

/// Top-level error type for the application.
#[derive(Debug, thiserror::Error)]
pub enum EagleEyeError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Search agent error.
    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    /// Source adapter or registry error.
    #[error("search error: {0}")]
    Search(#[from] eagleeye_search::SourceError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, EagleEyeError>;
