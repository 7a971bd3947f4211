//! Search and per-source configuration with sensible defaults.
//!
//! [`SearchConfig`] controls request behaviour shared by every adapter.
//! [`SourcesConfig`] carries the enablement flag and credentials for each
//! backend; the [`crate::registry::SourceRegistry`] turns it into the set
//! of active sources.

use crate::error::SourceError;
use crate::types::SourceKind;
use serde::{Deserialize, Serialize};

/// How source adapters reach their backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Direct REST/GraphQL calls from this process.
    #[default]
    Http,
    /// Tool calls against one MCP server subprocess per source.
    Mcp,
}

/// Shared search behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results requested from each source when the caller does not say.
    pub default_limit: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Which adapter family to use.
    pub transport: Transport,
    /// Custom User-Agent string. If `None`, `eagleeye/<version>` is sent.
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 3,
            timeout_seconds: 10,
            transport: Transport::Http,
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `default_limit` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.default_limit == 0 {
            return Err(SourceError::Config(
                "default_limit must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SourceError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Enablement and credentials for one backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Whether the source may be used at all.
    pub enabled: bool,
    /// API token / key. A source without one is treated as not configured.
    pub token: Option<String>,
    /// Slack workspace id (starts with `T`); ignored by other sources.
    pub team_id: Option<String>,
    /// Override for the backend's API base URL.
    pub base_url: Option<String>,
    /// Override for the tool server launch command: executable then arguments.
    pub server_command: Option<Vec<String>>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token: None,
            team_id: None,
            base_url: None,
            server_command: None,
        }
    }
}

impl SourceConfig {
    /// Returns the token if it is present and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    fn validate(&self, kind: SourceKind) -> Result<(), SourceError> {
        if let Some(base) = &self.base_url {
            url::Url::parse(base).map_err(|e| {
                SourceError::Config(format!("{kind}: invalid base_url {base:?}: {e}"))
            })?;
        }
        if let Some(command) = &self.server_command {
            if command.first().is_none_or(|exe| exe.trim().is_empty()) {
                return Err(SourceError::Config(format!(
                    "{kind}: server_command must name an executable"
                )));
            }
        }
        Ok(())
    }
}

/// Per-backend configuration for every supported source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Slack settings (bot token, team id).
    pub slack: SourceConfig,
    /// Notion settings (integration token).
    pub notion: SourceConfig,
    /// Linear settings (API key).
    pub linear: SourceConfig,
    /// GitHub settings (personal access token).
    pub github: SourceConfig,
}

impl SourcesConfig {
    /// Returns the settings for `kind`.
    pub fn get(&self, kind: SourceKind) -> &SourceConfig {
        match kind {
            SourceKind::Slack => &self.slack,
            SourceKind::Notion => &self.notion,
            SourceKind::Linear => &self.linear,
            SourceKind::GitHub => &self.github,
        }
    }

    /// Returns mutable settings for `kind`.
    pub fn get_mut(&mut self, kind: SourceKind) -> &mut SourceConfig {
        match kind {
            SourceKind::Slack => &mut self.slack,
            SourceKind::Notion => &mut self.notion,
            SourceKind::Linear => &mut self.linear,
            SourceKind::GitHub => &mut self.github,
        }
    }

    /// Validates every source's base URL and server command overrides.
    pub fn validate(&self) -> Result<(), SourceError> {
        for kind in SourceKind::all() {
            self.get(*kind).validate(*kind)?;
        }
        Ok(())
    }
}
