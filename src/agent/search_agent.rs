//! Agent-driven search with progress reporting.
//!
//! Progress follows the agent's tool activity:
//!
//! 1. `thinking` before the agent starts;
//! 2. `searching(source, completed)` whenever a tool call moves to a new
//!    source, with the previous source marked completed;
//! 3. `consolidating(completed)` when answer text arrives while a source is
//!    active, with that source marked completed. Repeats of the same update
//!    are suppressed.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use eagleeye_search::{
    ProgressSink, RelevanceFilter, SearchProgress, SourceKind, SourceRegistry,
    source_from_tool_name,
};
use futures_util::StreamExt;

use super::AgentError;
use super::messages::{AgentMessage, ContentBlock};
use super::prompt::system_prompt;
use super::runtime::{AgentOptions, AgentRuntime};
use crate::config::AgentConfig;

/// Returned when the agent finishes without writing any answer text.
pub const NO_RESULTS_MESSAGE: &str = "검색 결과를 찾지 못했습니다.";

/// Result subtype reported when the turn limit ends the run. The answer
/// captured so far is returned.
const MAX_TURNS_SUBTYPE: &str = "error_max_turns";

/// Answers questions by letting the agent search the configured sources.
pub struct SearchAgent {
    runtime: Arc<dyn AgentRuntime>,
    registry: Arc<SourceRegistry>,
    filter: RelevanceFilter,
    config: AgentConfig,
}

impl std::fmt::Debug for SearchAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchAgent")
            .field("sources", self.filter.universe())
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl SearchAgent {
    /// Offer the agent every source configured in `registry`.
    pub fn new(runtime: Arc<dyn AgentRuntime>, registry: Arc<SourceRegistry>, config: AgentConfig) -> Self {
        let filter = RelevanceFilter::new(registry.configured_kinds());
        tracing::info!(
            sources = ?filter.universe(),
            model = %config.model,
            "search agent initialized"
        );
        Self {
            runtime,
            registry,
            filter,
            config,
        }
    }

    /// Run options for `query`: only the relevant servers and their tools.
    pub fn options_for(&self, query: &str) -> AgentOptions {
        let selected = self.filter.select(query);
        let mcp_servers: Vec<_> = self
            .registry
            .descriptors()
            .filter(|d| selected.contains(&d.kind))
            .cloned()
            .collect();
        let qualified: Vec<String> = mcp_servers
            .iter()
            .flat_map(|d| d.qualified_agent_tools())
            .collect();
        let allowed_tools =
            RelevanceFilter::filter_tools(&selected, qualified.iter().map(String::as_str));

        tracing::debug!(
            query,
            servers = ?mcp_servers.iter().map(|d| d.kind).collect::<Vec<_>>(),
            tools = allowed_tools.len(),
            "agent sources filtered"
        );

        AgentOptions {
            system_prompt: system_prompt(&mcp_servers),
            mcp_servers,
            allowed_tools,
            model: self.config.model.clone(),
            permission_mode: self.config.permission_mode.clone(),
            max_turns: self.config.max_turns,
        }
    }

    /// Answer `query`, reporting progress to `progress` if given.
    ///
    /// Returns the last answer text the agent wrote, or
    /// [`NO_RESULTS_MESSAGE`] if it wrote none.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error if the agent cannot be started or its
    /// stream fails, and [`AgentError::Failed`] if the agent reports failure.
    /// Running out of turns is not a failure.
    pub async fn search(&self, query: &str, progress: Option<&ProgressSink>) -> Result<String, AgentError> {
        let started = Instant::now();
        tracing::info!(query, "agent search started");

        let result = self.run(query, progress, started).await;
        if let Err(e) = &result {
            tracing::error!(
                query,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "agent search failed"
            );
        }
        result
    }

    async fn run(&self, query: &str, progress: Option<&ProgressSink>, started: Instant) -> Result<String, AgentError> {
        let options = self.options_for(query);
        let mut tracker = ProgressTracker::default();
        emit(progress, tracker.start()).await;

        let mut stream = self.runtime.run(query, &options).await?;

        let mut answer = String::new();
        let mut messages = 0u32;
        let mut agent_turns: Option<u32> = None;
        let mut tool_names: Vec<String> = Vec::new();
        let mut first_message = true;

        while let Some(message) = stream.next().await {
            let message = message?;
            if first_message {
                first_message = false;
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    kind = message.kind(),
                    "first agent message received"
                );
            }
            messages += 1;

            match &message {
                AgentMessage::Assistant { .. } => {
                    for block in message.content() {
                        match block {
                            ContentBlock::ToolUse { name, .. } => {
                                tracing::debug!(
                                    tool = %name,
                                    messages,
                                    elapsed_ms = started.elapsed().as_millis() as u64,
                                    "tool use requested"
                                );
                                tool_names.push(name.clone());
                                emit(progress, tracker.tool_used(name)).await;
                            }
                            ContentBlock::Text { text } if !text.trim().is_empty() => {
                                answer.clone_from(text);
                                emit(progress, tracker.answered()).await;
                            }
                            _ => {}
                        }
                    }
                }
                AgentMessage::User { .. } => {
                    tracing::debug!(
                        messages,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "tool result received"
                    );
                }
                AgentMessage::Result {
                    result,
                    is_error,
                    num_turns,
                    subtype,
                } => {
                    agent_turns = *num_turns;
                    if *is_error && subtype.as_deref() == Some(MAX_TURNS_SUBTYPE) {
                        tracing::warn!(query, num_turns = ?num_turns, "agent hit the turn limit");
                        continue;
                    }
                    if *is_error {
                        let detail = result
                            .as_deref()
                            .or(subtype.as_deref())
                            .unwrap_or("agent reported an error");
                        return Err(AgentError::Failed(detail.to_owned()));
                    }
                    if let Some(text) = result.as_deref().filter(|t| !t.trim().is_empty()) {
                        answer = text.to_owned();
                        emit(progress, tracker.answered()).await;
                    }
                    tracing::debug!(num_turns = ?num_turns, "agent result received");
                }
                AgentMessage::System { .. } | AgentMessage::Unknown => {}
            }
        }

        tracing::info!(
            query,
            elapsed_ms = started.elapsed().as_millis() as u64,
            messages,
            turns = ?agent_turns,
            tool_calls = tool_names.len(),
            tools = ?tool_names,
            "agent search completed"
        );

        if answer.trim().is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_owned());
        }
        Ok(answer)
    }

    /// Sources the agent may be offered.
    pub fn sources(&self) -> &BTreeSet<SourceKind> {
        self.filter.universe()
    }
}

async fn emit(sink: Option<&ProgressSink>, update: Option<SearchProgress>) {
    if let (Some(sink), Some(update)) = (sink, update) {
        sink.emit(update).await;
    }
}

/// Derives progress updates from tool activity.
#[derive(Debug, Default)]
struct ProgressTracker {
    current: Option<SourceKind>,
    completed: Vec<SourceKind>,
    last: Option<SearchProgress>,
}

impl ProgressTracker {
    fn start(&mut self) -> Option<SearchProgress> {
        self.publish(SearchProgress::thinking())
    }

    fn tool_used(&mut self, tool_name: &str) -> Option<SearchProgress> {
        let source = source_from_tool_name(tool_name)?;
        if self.current == Some(source) {
            return None;
        }
        self.complete_current();
        self.current = Some(source);
        self.publish(SearchProgress::searching(source, &self.completed))
    }

    /// Text written while a source is active. Text before the first tool
    /// call is not reported. The source stays active so that a further call
    /// to it does not count as a new search.
    fn answered(&mut self) -> Option<SearchProgress> {
        self.current?;
        self.complete_current();
        self.publish(SearchProgress::consolidating(&self.completed))
    }

    fn complete_current(&mut self) {
        if let Some(current) = self.current {
            if !self.completed.contains(&current) {
                self.completed.push(current);
            }
        }
    }

    fn publish(&mut self, update: SearchProgress) -> Option<SearchProgress> {
        if self.last.as_ref() == Some(&update) {
            return None;
        }
        self.last = Some(update.clone());
        Some(update)
    }
}
