//! Launching the agent and streaming its events.

use std::pin::Pin;
use std::process::Stdio;

use async_trait::async_trait;
use eagleeye_search::SourceDescriptor;
use futures_util::Stream;
use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use super::AgentError;
use super::messages::{AgentMessage, parse_line};

/// Stream of agent events for one run. Dropping it stops the agent.
pub type AgentMessageStream = Pin<Box<dyn Stream<Item = Result<AgentMessage, AgentError>> + Send>>;

/// Stderr kept for error messages, in bytes.
const STDERR_TAIL_BYTES: usize = 512;

/// Everything the agent needs for one run besides the prompt.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// System prompt.
    pub system_prompt: String,
    /// Tool servers the agent may launch.
    pub mcp_servers: Vec<SourceDescriptor>,
    /// Fully qualified tool names the agent may call.
    pub allowed_tools: Vec<String>,
    /// Model identifier.
    pub model: String,
    /// Permission mode for tool calls.
    pub permission_mode: String,
    /// Maximum number of turns.
    pub max_turns: u32,
}

impl AgentOptions {
    /// Tool server configuration in the agent's `mcpServers` format.
    pub fn mcp_config(&self) -> Value {
        let servers: Map<String, Value> = self
            .mcp_servers
            .iter()
            .map(|d| {
                (
                    d.kind.to_string(),
                    json!({
                        "type": "stdio",
                        "command": d.command,
                        "args": d.args,
                        "env": d.env,
                    }),
                )
            })
            .collect();
        json!({ "mcpServers": servers })
    }
}

/// Something that can run the agent and stream its events.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Start a run for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Spawn`] if the agent cannot be started. Errors
    /// after start are delivered through the stream.
    async fn run(&self, prompt: &str, options: &AgentOptions) -> Result<AgentMessageStream, AgentError>;
}

/// Runs the `claude` CLI in print mode with `stream-json` output.
#[derive(Debug, Clone)]
pub struct ClaudeCliRuntime {
    command: String,
}

impl ClaudeCliRuntime {
    /// Use `command` as the agent executable.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Command-line arguments for one run.
    pub fn arguments(prompt: &str, options: &AgentOptions) -> Vec<String> {
        let mut args = vec![
            "-p".to_owned(),
            prompt.to_owned(),
            "--output-format".to_owned(),
            "stream-json".to_owned(),
            "--verbose".to_owned(),
            "--model".to_owned(),
            options.model.clone(),
            "--max-turns".to_owned(),
            options.max_turns.to_string(),
            "--permission-mode".to_owned(),
            options.permission_mode.clone(),
            "--system-prompt".to_owned(),
            options.system_prompt.clone(),
        ];
        if !options.mcp_servers.is_empty() {
            args.push("--mcp-config".to_owned());
            args.push(options.mcp_config().to_string());
            args.push("--strict-mcp-config".to_owned());
        }
        if !options.allowed_tools.is_empty() {
            args.push("--allowedTools".to_owned());
            args.push(options.allowed_tools.join(","));
        }
        args
    }
}

impl Default for ClaudeCliRuntime {
    fn default() -> Self {
        Self::new("claude")
    }
}

#[async_trait]
impl AgentRuntime for ClaudeCliRuntime {
    async fn run(&self, prompt: &str, options: &AgentOptions) -> Result<AgentMessageStream, AgentError> {
        let mut child = Command::new(&self.command)
            .args(Self::arguments(prompt, options))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AgentError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Stream("agent stdout was not captured".to_owned()))?;
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        tracing::debug!(
            command = %self.command,
            model = %options.model,
            servers = options.mcp_servers.len(),
            tools = options.allowed_tools.len(),
            "agent started"
        );

        let stream = async_stream::stream! {
            let mut lines = BufReader::new(stdout).lines();
            let mut saw_result = false;
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match parse_line(&line) {
                            Ok(message) => {
                                saw_result |= matches!(message, AgentMessage::Result { .. });
                                yield Ok(message);
                            }
                            Err(e) => tracing::debug!(error = %e, "skipping agent output line"),
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(AgentError::Stream(format!("reading agent output: {e}")));
                        return;
                    }
                }
            }

            let status = child.wait().await;
            let stderr = match stderr_task {
                Some(task) => task.await.unwrap_or_default(),
                None => String::new(),
            };
            match status {
                Ok(status) if !status.success() && !saw_result => {
                    yield Err(AgentError::Failed(format!(
                        "agent exited with {status}: {}",
                        tail(&stderr, STDERR_TAIL_BYTES)
                    )));
                }
                Ok(status) => tracing::debug!(%status, "agent exited"),
                Err(e) => yield Err(AgentError::Stream(format!("waiting for agent: {e}"))),
            }
        };

        Ok(Box::pin(stream))
    }
}

fn tail(text: &str, max_bytes: usize) -> &str {
    let text = text.trim();
    if text.len() <= max_bytes {
        return text;
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
