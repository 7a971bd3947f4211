//! Agent search state machine against a scripted runtime.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use eagleeye::agent::{
    AgentError, AgentMessage, AgentMessageStream, AgentOptions, AgentRuntime, NO_RESULTS_MESSAGE,
    SearchAgent,
};
use eagleeye::agent::messages::parse_line;
use eagleeye::config::AgentConfig;
use eagleeye_search::{
    SearchProgress, SourceConfig, SourceKind, SourceRegistry, SourcesConfig, progress_channel,
};

/// Replays a fixed event list and records the options of each run.
struct ScriptedRuntime {
    events: Mutex<Option<Vec<Result<AgentMessage, AgentError>>>>,
    seen: Mutex<Vec<(String, AgentOptions)>>,
}

impl ScriptedRuntime {
    fn new(events: Vec<Result<AgentMessage, AgentError>>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Some(events)),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn lines(lines: &[&str]) -> Arc<Self> {
        Self::new(lines.iter().map(|l| Ok(parse_line(l).unwrap())).collect())
    }

    fn last_options(&self) -> AgentOptions {
        self.seen.lock().unwrap().last().unwrap().1.clone()
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn run(&self, prompt: &str, options: &AgentOptions) -> Result<AgentMessageStream, AgentError> {
        self.seen
            .lock()
            .unwrap()
            .push((prompt.to_owned(), options.clone()));
        let events = self.events.lock().unwrap().take().unwrap_or_default();
        Ok(Box::pin(futures_util::stream::iter(events)))
    }
}

struct FailingRuntime;

#[async_trait]
impl AgentRuntime for FailingRuntime {
    async fn run(&self, _prompt: &str, _options: &AgentOptions) -> Result<AgentMessageStream, AgentError> {
        Err(AgentError::Spawn {
            command: "claude".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    }
}

fn registry(kinds: &[SourceKind]) -> Arc<SourceRegistry> {
    let mut config = SourcesConfig::default();
    for kind in kinds {
        *config.get_mut(*kind) = SourceConfig {
            token: Some(format!("{kind}-token")),
            ..SourceConfig::default()
        };
    }
    Arc::new(SourceRegistry::from_config(&config))
}

fn all_sources() -> Arc<SourceRegistry> {
    registry(SourceKind::all())
}

fn tool_use(name: &str) -> String {
    serde_json::json!({
        "type": "assistant",
        "message": {"content": [{"type": "tool_use", "id": "t", "name": name, "input": {}}]}
    })
    .to_string()
}

fn text(text: &str) -> String {
    serde_json::json!({
        "type": "assistant",
        "message": {"content": [{"type": "text", "text": text}]}
    })
    .to_string()
}

const TOOL_RESULT: &str =
    r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t","content":"[]"}]}}"#;
const INIT: &str = r#"{"type":"system","subtype":"init"}"#;

async fn run_collecting(
    agent: &SearchAgent,
    query: &str,
) -> (Result<String, AgentError>, Vec<SearchProgress>) {
    let (sink, mut rx) = progress_channel(32);
    let result = agent.search(query, Some(&sink)).await;
    drop(sink);
    let mut updates = Vec::new();
    while let Some(update) = rx.recv().await {
        updates.push(update);
    }
    (result, updates)
}

#[tokio::test]
async fn progress_follows_sources_in_order() {
    let slack_a = tool_use("mcp__slack__slack_list_channels");
    let slack_b = tool_use("mcp__slack__slack_get_channel_history");
    let linear = tool_use("mcp__linear__linear_searchIssues");
    let answer = text("Two threads and one issue mention the outage.");
    let runtime = ScriptedRuntime::lines(&[
        INIT,
        slack_a.as_str(),
        TOOL_RESULT,
        slack_b.as_str(),
        TOOL_RESULT,
        linear.as_str(),
        TOOL_RESULT,
        answer.as_str(),
    ]);
    let agent = SearchAgent::new(runtime, all_sources(), AgentConfig::default());

    let (result, updates) = run_collecting(&agent, "outage").await;

    assert_eq!(result.unwrap(), "Two threads and one issue mention the outage.");
    assert_eq!(
        updates,
        vec![
            SearchProgress::thinking(),
            SearchProgress::searching(SourceKind::Slack, &[]),
            SearchProgress::searching(SourceKind::Linear, &[SourceKind::Slack]),
            SearchProgress::consolidating(&[SourceKind::Slack, SourceKind::Linear]),
        ]
    );
}

#[tokio::test]
async fn result_text_repeating_answer_is_not_reported_twice() {
    let github = tool_use("mcp__github__search_code");
    let answer = text("Found it in auth.rs");
    let runtime = ScriptedRuntime::lines(&[
        github.as_str(),
        TOOL_RESULT,
        answer.as_str(),
        r#"{"type":"result","subtype":"success","is_error":false,"num_turns":2,"result":"Found it in auth.rs"}"#,
    ]);
    let agent = SearchAgent::new(runtime, all_sources(), AgentConfig::default());

    let (result, updates) = run_collecting(&agent, "where is auth code").await;

    assert_eq!(result.unwrap(), "Found it in auth.rs");
    let consolidating = updates
        .iter()
        .filter(|u| *u == &SearchProgress::consolidating(&[SourceKind::GitHub]))
        .count();
    assert_eq!(consolidating, 1);
}

#[tokio::test]
async fn result_message_alone_supplies_the_answer() {
    let runtime = ScriptedRuntime::lines(&[
        r#"{"type":"result","subtype":"success","is_error":false,"result":"Nothing relevant this week."}"#,
    ]);
    let agent = SearchAgent::new(runtime, all_sources(), AgentConfig::default());
    let (result, updates) = run_collecting(&agent, "status").await;

    assert_eq!(result.unwrap(), "Nothing relevant this week.");
    assert_eq!(updates, vec![SearchProgress::thinking()]);
}

#[tokio::test]
async fn text_between_tool_calls_follows_active_source() {
    let preamble = text("Let me check Slack first.");
    let slack = tool_use("mcp__slack__slack_list_channels");
    let interim = text("Slack mentions ENG-12, checking Linear.");
    let linear = tool_use("mcp__linear__linear_searchIssues");
    let answer = text("ENG-12 is in review.");
    let runtime = ScriptedRuntime::lines(&[
        INIT,
        preamble.as_str(),
        slack.as_str(),
        TOOL_RESULT,
        interim.as_str(),
        linear.as_str(),
        TOOL_RESULT,
        answer.as_str(),
    ]);
    let agent = SearchAgent::new(runtime, all_sources(), AgentConfig::default());

    let (result, updates) = run_collecting(&agent, "ENG-12 status").await;

    assert_eq!(result.unwrap(), "ENG-12 is in review.");
    assert_eq!(
        updates,
        vec![
            SearchProgress::thinking(),
            SearchProgress::searching(SourceKind::Slack, &[]),
            SearchProgress::consolidating(&[SourceKind::Slack]),
            SearchProgress::searching(SourceKind::Linear, &[SourceKind::Slack]),
            SearchProgress::consolidating(&[SourceKind::Slack, SourceKind::Linear]),
        ]
    );
}

#[tokio::test]
async fn returning_to_the_active_source_is_not_a_new_search() {
    let list = tool_use("mcp__slack__slack_list_channels");
    let history = tool_use("mcp__slack__slack_get_channel_history");
    let interim = text("Found #infra, reading history.");
    let answer = text("#infra discussed the deploy.");
    let runtime = ScriptedRuntime::lines(&[
        list.as_str(),
        TOOL_RESULT,
        interim.as_str(),
        history.as_str(),
        TOOL_RESULT,
        answer.as_str(),
    ]);
    let agent = SearchAgent::new(runtime, all_sources(), AgentConfig::default());

    let (result, updates) = run_collecting(&agent, "deploy").await;

    assert_eq!(result.unwrap(), "#infra discussed the deploy.");
    assert_eq!(
        updates,
        vec![
            SearchProgress::thinking(),
            SearchProgress::searching(SourceKind::Slack, &[]),
            SearchProgress::consolidating(&[SourceKind::Slack]),
        ]
    );
}

#[tokio::test]
async fn no_answer_text_gives_placeholder() {
    let notion = tool_use("mcp__notion__API-post-search");
    let runtime = ScriptedRuntime::lines(&[notion.as_str(), TOOL_RESULT]);
    let agent = SearchAgent::new(runtime, all_sources(), AgentConfig::default());

    let (result, updates) = run_collecting(&agent, "roadmap doc").await;

    assert_eq!(result.unwrap(), NO_RESULTS_MESSAGE);
    assert_eq!(
        updates,
        vec![
            SearchProgress::thinking(),
            SearchProgress::searching(SourceKind::Notion, &[]),
        ]
    );
}

#[tokio::test]
async fn empty_stream_gives_placeholder_without_progress_sink() {
    let runtime = ScriptedRuntime::new(vec![]);
    let agent = SearchAgent::new(runtime, all_sources(), AgentConfig::default());
    assert_eq!(agent.search("anything", None).await.unwrap(), NO_RESULTS_MESSAGE);
}

#[tokio::test]
async fn stream_error_propagates() {
    let slack = tool_use("mcp__slack__slack_list_channels");
    let runtime = ScriptedRuntime::new(vec![
        Ok(parse_line(&slack).unwrap()),
        Err(AgentError::Stream("pipe closed".into())),
        Ok(parse_line(&text("never seen")).unwrap()),
    ]);
    let agent = SearchAgent::new(runtime, all_sources(), AgentConfig::default());

    let err = agent.search("slack outage", None).await.unwrap_err();
    assert!(matches!(err, AgentError::Stream(ref m) if m == "pipe closed"));
}

#[tokio::test]
async fn error_result_is_failure() {
    let runtime = ScriptedRuntime::lines(&[
        r#"{"type":"result","subtype":"error_during_execution","is_error":true,"num_turns":3}"#,
    ]);
    let agent = SearchAgent::new(runtime, all_sources(), AgentConfig::default());

    let err = agent.search("too broad", None).await.unwrap_err();
    assert!(matches!(err, AgentError::Failed(ref m) if m == "error_during_execution"));
}

#[tokio::test]
async fn turn_limit_returns_captured_answer() {
    let slack = tool_use("mcp__slack__slack_list_channels");
    let partial = text("Partial: #infra discussed the outage.");
    let limited = r#"{"type":"result","subtype":"error_max_turns","is_error":true,"num_turns":15}"#;

    let runtime = ScriptedRuntime::lines(&[slack.as_str(), partial.as_str(), limited]);
    let agent = SearchAgent::new(runtime, all_sources(), AgentConfig::default());
    assert_eq!(
        agent.search("outage", None).await.unwrap(),
        "Partial: #infra discussed the outage."
    );

    let runtime = ScriptedRuntime::lines(&[slack.as_str(), TOOL_RESULT, limited]);
    let agent = SearchAgent::new(runtime, all_sources(), AgentConfig::default());
    assert_eq!(agent.search("outage", None).await.unwrap(), NO_RESULTS_MESSAGE);
}

#[tokio::test]
async fn spawn_failure_propagates_after_thinking() {
    let agent = SearchAgent::new(Arc::new(FailingRuntime), all_sources(), AgentConfig::default());
    let (result, updates) = run_collecting(&agent, "q").await;

    assert!(matches!(result, Err(AgentError::Spawn { .. })));
    assert_eq!(updates, vec![SearchProgress::thinking()]);
}

#[tokio::test]
async fn options_are_narrowed_to_relevant_sources() {
    let runtime = ScriptedRuntime::new(vec![]);
    let agent = SearchAgent::new(runtime.clone(), all_sources(), AgentConfig::default());

    agent.search("linear 이슈 상태", None).await.unwrap();

    let options = runtime.last_options();
    let kinds: Vec<_> = options.mcp_servers.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![SourceKind::Linear]);
    assert!(!options.allowed_tools.is_empty());
    assert!(options
        .allowed_tools
        .iter()
        .all(|t| t.starts_with("mcp__linear__")));
    assert_eq!(options.max_turns, 15);
    assert_eq!(options.permission_mode, "bypassPermissions");
    assert!(options.system_prompt.contains("mcp__linear__linear_searchIssues"));
}

#[tokio::test]
async fn unmatched_query_offers_every_configured_source() {
    let runtime = ScriptedRuntime::new(vec![]);
    let agent = SearchAgent::new(
        runtime.clone(),
        registry(&[SourceKind::Slack, SourceKind::GitHub]),
        AgentConfig::default(),
    );

    agent.search("what happened yesterday", None).await.unwrap();

    let options = runtime.last_options();
    let kinds: Vec<_> = options.mcp_servers.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![SourceKind::Slack, SourceKind::GitHub]);
    assert!(options.allowed_tools.iter().any(|t| t.starts_with("mcp__slack__")));
    assert!(options.allowed_tools.iter().any(|t| t.starts_with("mcp__github__")));
}
