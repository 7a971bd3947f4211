//! Error types for the eagleeye-search crate.
//!
//! These errors never reach callers of [`crate::SourceClient::search`]:
//! adapters convert them into an empty result contribution plus a log
//! entry. They are surfaced by the fallible `try_search` layer, the tool
//! invocation boundary, and configuration validation. No credentials
//! appear in error messages.

/// Errors that can occur while querying a single source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The backend answered with a non-success status or an API-level
    /// failure flag (e.g. Slack's `"ok": false`).
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code, or 200 for API-level failures.
        status: u16,
        /// Short description taken from the response.
        message: String,
    },

    /// The response payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A tool invocation failed or reported an error result.
    #[error("tool error: {0}")]
    Tool(String),

    /// Invalid search or source configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Convenience type alias for eagleeye-search results.
pub type Result<T> = std::result::Result<T, SourceError>;
