//! Shared HTTP client construction for the REST/GraphQL source adapters.

use crate::config::SearchConfig;
use crate::error::SourceError;
use std::time::Duration;

/// User-Agent sent when the config does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("eagleeye/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] configured for backend API calls.
///
/// The client has:
/// - Timeout from config (adapters own their request timeouts)
/// - The configured User-Agent, or [`DEFAULT_USER_AGENT`]
/// - gzip decompression
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SourceError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SourceError::Http(format!("failed to build HTTP client: {e}")))
}

/// Turn a non-success response into [`SourceError::Status`].
///
/// The body is read for the error message and cut to keep logs short.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read body".into());
    Err(SourceError::Status {
        status: status.as_u16(),
        message: body.chars().take(200).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_agent_names_the_crate_version() {
        assert!(DEFAULT_USER_AGENT.starts_with("eagleeye/"));
    }

    #[test]
    fn build_client_with_default_config() {
        let client = build_client(&SearchConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn build_client_with_custom_ua() {
        let config = SearchConfig {
            user_agent: Some("CustomBot/1.0".into()),
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
    }
}
