//! Application settings loaded from TOML with environment overrides.
//!
//! ```toml
//! [search]
//! default_limit = 3
//! transport = "http"      # or "mcp"
//!
//! [sources.slack]
//! token = "xoxb-..."
//! team_id = "T0123"
//!
//! [sources.linear]
//! enabled = false
//!
//! [agent]
//! model = "claude-sonnet-4-20250514"
//! max_turns = 15
//!
//! [logging]
//! debug = true
//! file = true             # daily files under the data dir
//! ```
//!
//! Every section is optional. Credentials are usually supplied through the
//! environment instead (see [`Settings::apply_env`]).

use std::path::{Path, PathBuf};

use eagleeye_search::{SearchConfig, SourceKind, SourcesConfig};
use serde::{Deserialize, Serialize};

use crate::error::{EagleEyeError, Result};

/// Default agent model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Shared search behaviour.
    pub search: SearchConfig,
    /// Per-source enablement and credentials.
    pub sources: SourcesConfig,
    /// Streaming agent settings.
    pub agent: AgentConfig,
    /// Tool server connection settings.
    pub mcp: McpConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Settings for the agent-driven search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Executable of the agent CLI.
    pub command: String,
    /// Model identifier passed to the agent.
    pub model: String,
    /// Maximum agent turns per query.
    pub max_turns: u32,
    /// Permission mode passed to the agent.
    pub permission_mode: String,
    /// Capacity of the progress channel.
    pub progress_buffer: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            max_turns: 15,
            permission_mode: "bypassPermissions".to_owned(),
            progress_buffer: 16,
        }
    }
}

/// Settings for tool server subprocesses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// Per-request timeout in seconds, including the initial handshake.
    pub request_timeout_seconds: u64,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log at debug level, including per-source timings.
    pub debug: bool,
    /// Also write daily-rotated log files.
    pub file: bool,
    /// Directory for log files; setting it implies `file`.
    /// Defaults to [`crate::paths::logs_dir`].
    pub directory: Option<PathBuf>,
}

impl LoggingConfig {
    /// Where rotated log files go, or `None` when file logging is off.
    pub fn file_directory(&self) -> Option<PathBuf> {
        match &self.directory {
            Some(dir) => Some(dir.clone()),
            None if self.file => Some(crate::paths::logs_dir()),
            None => None,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| EagleEyeError::Config(e.to_string()))
    }

    /// Load from `path` if given, else from the default path when it exists,
    /// else defaults; then apply the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named or existing file is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Self::default_config_path();
                if default.is_file() {
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Returns the default config file path: `<config dir>/eagleeye/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::paths::config_file()
    }

    /// Override settings from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Override settings from `lookup`.
    ///
    /// | Variable | Setting |
    /// |----------|---------|
    /// | `SLACK_BOT_TOKEN` | `sources.slack.token` |
    /// | `SLACK_TEAM_ID` | `sources.slack.team_id` |
    /// | `NOTION_API_KEY` | `sources.notion.token` |
    /// | `LINEAR_API_KEY` | `sources.linear.token` |
    /// | `GITHUB_TOKEN` | `sources.github.token` |
    /// | `CLAUDE_MODEL` | `agent.model` |
    /// | `EAGLEEYE_DEBUG` | `logging.debug` (`1`/`true`/`yes`) |
    ///
    /// Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tokens = [
            ("SLACK_BOT_TOKEN", SourceKind::Slack),
            ("NOTION_API_KEY", SourceKind::Notion),
            ("LINEAR_API_KEY", SourceKind::Linear),
            ("GITHUB_TOKEN", SourceKind::GitHub),
        ];
        for (key, kind) in tokens {
            if let Some(token) = get(key) {
                self.sources.get_mut(kind).token = Some(token);
            }
        }
        if let Some(team) = get("SLACK_TEAM_ID") {
            self.sources.slack.team_id = Some(team);
        }
        if let Some(model) = get("CLAUDE_MODEL") {
            self.agent.model = model;
        }
        if let Some(debug) = get("EAGLEEYE_DEBUG") {
            self.logging.debug = matches!(
                debug.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }

    /// Validates all sections.
    ///
    /// # Errors
    ///
    /// Returns [`EagleEyeError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.search
            .validate()
            .map_err(|e| EagleEyeError::Config(e.to_string()))?;
        self.sources
            .validate()
            .map_err(|e| EagleEyeError::Config(e.to_string()))?;
        if self.agent.max_turns == 0 {
            return Err(EagleEyeError::Config(
                "agent.max_turns must be greater than 0".into(),
            ));
        }
        if self.agent.command.trim().is_empty() {
            return Err(EagleEyeError::Config("agent.command must not be empty".into()));
        }
        if self.mcp.request_timeout_seconds == 0 {
            return Err(EagleEyeError::Config(
                "mcp.request_timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
