//! Slack: message search.
//!
//! Two adapters:
//!
//! - [`SlackSearchClient`] calls the Web API `search.messages` method.
//! - [`SlackHistoryClient`] works through a tool server that has no search
//!   primitive. It lists a bounded number of channels, reads a bounded
//!   window of recent history per channel, and keeps messages whose text
//!   contains the query (case-insensitive). Recall is limited to that
//!   recent window.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::fields::{first_str, records, scalar_field, str_field};
use crate::config::SearchConfig;
use crate::error::SourceError;
use crate::http;
use crate::source::SourceClient;
use crate::tool::{ToolInvoker, ToolOutput};
use crate::types::{NormalizedResult, SourceKind};

/// Default Web API base URL.
pub const SLACK_API_BASE: &str = "https://slack.com";

/// Tool that lists channels.
pub const SLACK_LIST_CHANNELS: &str = "slack_list_channels";

/// Tool that returns recent messages of one channel.
pub const SLACK_GET_CHANNEL_HISTORY: &str = "slack_get_channel_history";

/// Channels requested from the listing tool.
pub const CHANNEL_LIST_LIMIT: usize = 10;

/// Channels whose history is scanned at most.
pub const MAX_CHANNELS_SCANNED: usize = 5;

/// Messages fetched per channel.
pub const HISTORY_WINDOW: usize = 20;

/// Slack `search.messages` adapter.
pub struct SlackSearchClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl SlackSearchClient {
    /// Create a client for the given token.
    ///
    /// `search.messages` requires a token with the `search:read` scope.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>, config: &SearchConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::build_client(config)?,
            token: token.into(),
            base_url: SLACK_API_BASE.to_owned(),
        })
    }

    /// Set the base URL (useful for testing with mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

#[async_trait]
impl SourceClient for SlackSearchClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Slack
    }

    async fn try_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedResult>, SourceError> {
        tracing::trace!(query, limit, "Slack search");

        let count = limit.to_string();
        let response = self
            .client
            .get(format!("{}/api/search.messages", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("query", query), ("count", count.as_str())])
            .send()
            .await?;
        let payload: Value = http::ensure_success(response).await?.json().await?;

        // The Web API reports failures with HTTP 200 and `"ok": false`.
        if payload.get("ok").and_then(Value::as_bool) != Some(true) {
            return Err(SourceError::Status {
                status: 200,
                message: str_field(&payload, "error").unwrap_or("unknown error").to_owned(),
            });
        }

        let matches = payload
            .pointer("/messages/matches")
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        let results: Vec<NormalizedResult> = records(&matches)
            .into_iter()
            .filter_map(map_search_match)
            .take(limit)
            .collect();
        tracing::debug!(count = results.len(), "Slack results parsed");
        Ok(results)
    }
}

/// Map one `search.messages` match.
pub(crate) fn map_search_match(message: &Value) -> Option<NormalizedResult> {
    if !message.is_object() {
        return None;
    }
    let channel = message
        .get("channel")
        .and_then(|c| str_field(c, "name"))
        .unwrap_or("unknown");
    // Slack `ts` is "<seconds>.<sequence>"; only the seconds part is a time.
    let timestamp = str_field(message, "ts").and_then(|ts| ts.split('.').next());

    Some(
        NormalizedResult::new(
            SourceKind::Slack,
            format!("#{channel}"),
            str_field(message, "permalink").unwrap_or_default(),
            str_field(message, "text").unwrap_or_default(),
        )
        .with_author(first_str(message, &["username", "user"]))
        .with_timestamp(timestamp),
    )
}

/// Channel-history adapter over a Slack tool server.
pub struct SlackHistoryClient {
    tools: Arc<dyn ToolInvoker>,
}

impl SlackHistoryClient {
    /// Wrap a connection to a Slack tool server.
    pub fn new(tools: Arc<dyn ToolInvoker>) -> Self {
        Self { tools }
    }

    async fn channel_history(
        &self,
        channel: &Channel,
        query_lower: &str,
    ) -> Result<Vec<NormalizedResult>, SourceError> {
        let output = self
            .tools
            .call_tool(
                SLACK_GET_CHANNEL_HISTORY,
                json!({ "channel_id": channel.id, "limit": HISTORY_WINDOW }),
            )
            .await?
            .into_result(SLACK_GET_CHANNEL_HISTORY)?;
        Ok(filter_history(&output, &channel.name, query_lower))
    }
}

#[async_trait]
impl SourceClient for SlackHistoryClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Slack
    }

    async fn try_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedResult>, SourceError> {
        let query_lower = query.to_lowercase();

        let listing = self
            .tools
            .call_tool(SLACK_LIST_CHANNELS, json!({ "limit": CHANNEL_LIST_LIMIT }))
            .await?
            .into_result(SLACK_LIST_CHANNELS)?;
        let channels = parse_channels(&listing);
        tracing::debug!(channels = channels.len(), "Slack channels listed");

        let mut results = Vec::new();
        for channel in channels.iter().take(MAX_CHANNELS_SCANNED) {
            match self.channel_history(channel, &query_lower).await {
                Ok(found) => results.extend(found),
                Err(err) => {
                    tracing::warn!(channel_id = %channel.id, error = %err, "Slack channel history failed");
                }
            }
            if results.len() >= limit {
                break;
            }
        }

        results.truncate(limit);
        Ok(results)
    }
}

/// A channel returned by the listing tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Channel {
    pub(crate) id: String,
    pub(crate) name: String,
}

/// Parse channels from every JSON text item of a listing result.
///
/// Accepts a bare array or an object with a `channels` array. Text that
/// is not JSON and channels without an id are skipped.
pub(crate) fn parse_channels(output: &ToolOutput) -> Vec<Channel> {
    output
        .texts()
        .filter_map(|text| serde_json::from_str::<Value>(text).ok())
        .flat_map(|payload| {
            records(&payload)
                .into_iter()
                .filter_map(|c| {
                    Some(Channel {
                        id: str_field(c, "id")?.to_owned(),
                        name: str_field(c, "name").unwrap_or("unknown").to_owned(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Keep history messages whose text contains `query_lower`.
pub(crate) fn filter_history(
    output: &ToolOutput,
    channel_name: &str,
    query_lower: &str,
) -> Vec<NormalizedResult> {
    output
        .texts()
        .filter_map(|text| serde_json::from_str::<Value>(text).ok())
        .flat_map(|payload| {
            records(&payload)
                .into_iter()
                .filter_map(|message| {
                    let text = str_field(message, "text")?;
                    if !text.to_lowercase().contains(query_lower) {
                        return None;
                    }
                    Some(
                        NormalizedResult::new(
                            SourceKind::Slack,
                            format!("#{channel_name}"),
                            str_field(message, "permalink").unwrap_or_default(),
                            text,
                        )
                        .with_author(first_str(message, &["user", "username"]))
                        .with_timestamp(scalar_field(message, "ts")),
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
