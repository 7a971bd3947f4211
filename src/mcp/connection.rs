//! A live connection to one tool server.
//!
//! Requests are written to the child's stdin as JSON lines and answered on
//! its stdout. One request is in flight at a time; concurrent callers queue
//! on an internal lock. Every request is bounded by the configured timeout
//! and every response line by [`MAX_LINE_BYTES`].

use std::fmt;
use std::process::Stdio;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use eagleeye_search::{SourceDescriptor, SourceError, SourceKind, ToolInvoker, ToolOutput};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::McpError;
use super::protocol::{
    JsonRpcRequest, METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
    ServerMessage, ToolsListResult, initialize_params,
};
use crate::config::McpConfig;

/// Maximum bytes accepted for a single response line (4 MiB).
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

type BoxedReader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

struct Channel {
    reader: BoxedReader,
    writer: BoxedWriter,
    next_id: u64,
}

/// A connected tool server for one source.
///
/// The child process, if any, is killed when this value is dropped.
pub struct McpConnection {
    kind: SourceKind,
    channel: Mutex<Channel>,
    child: StdMutex<Option<Child>>,
    request_timeout: Duration,
}

impl fmt::Debug for McpConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpConnection")
            .field("kind", &self.kind)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl McpConnection {
    /// Launch the server described by `descriptor` and perform the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Spawn`] if the process cannot be started, or any
    /// handshake error. The process is killed on failure.
    pub async fn connect(descriptor: &SourceDescriptor, config: &McpConfig) -> Result<Self, McpError> {
        let mut child = Command::new(&descriptor.command)
            .args(&descriptor.args)
            .envs(&descriptor.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| McpError::Spawn {
                command: descriptor.command.clone(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Protocol("child stdin was not captured".to_owned()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Protocol("child stdout was not captured".to_owned()))?;
        if let Some(stderr) = child.stderr.take() {
            forward_stderr(descriptor.kind, stderr);
        }

        tracing::debug!(
            source = %descriptor.kind,
            command = %descriptor.command,
            args = ?descriptor.args,
            "spawned tool server"
        );

        let connection = Self::from_io(
            descriptor.kind,
            stdout,
            stdin,
            Duration::from_secs(config.request_timeout_seconds),
        );
        *connection.child_slot() = Some(child);

        connection.initialize().await?;
        match connection.tools().await {
            Ok(tools) => {
                tracing::debug!(source = %descriptor.kind, tools = ?tools, "tool server ready");
            }
            Err(e) => {
                tracing::warn!(source = %descriptor.kind, error = %e, "could not list tools");
            }
        }
        Ok(connection)
    }

    /// Wrap an already-connected pair of streams. No handshake is performed.
    pub fn from_io<R, W>(kind: SourceKind, reader: R, writer: W, request_timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        let writer: BoxedWriter = Box::new(writer);
        Self {
            kind,
            channel: Mutex::new(Channel {
                reader: BufReader::new(reader),
                writer,
                next_id: 1,
            }),
            child: StdMutex::new(None),
            request_timeout,
        }
    }

    /// Which source this server backs.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Run the `initialize` handshake followed by the `initialized` notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects or does not answer the request.
    pub async fn initialize(&self) -> Result<(), McpError> {
        let result = self.request(METHOD_INITIALIZE, Some(initialize_params())).await?;
        let server = result
            .pointer("/serverInfo/name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        tracing::debug!(source = %self.kind, server, "tool server initialized");
        self.notify(METHOD_INITIALIZED).await
    }

    /// Names of the tools the server exposes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the result is malformed.
    pub async fn tools(&self) -> Result<Vec<String>, McpError> {
        let result = self.request(METHOD_TOOLS_LIST, None).await?;
        let list: ToolsListResult = serde_json::from_value(result)?;
        Ok(list.tools.into_iter().map(|t| t.name).collect())
    }

    /// Invoke one tool.
    ///
    /// A tool-level failure is reported through [`ToolOutput::is_error`],
    /// not as an `Err`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the result is malformed.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<ToolOutput, McpError> {
        let params = json!({ "name": name, "arguments": arguments });
        let result = self.request(METHOD_TOOLS_CALL, Some(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Kill the server process and wait for it to exit.
    pub async fn disconnect(&self) {
        let child = self.child_slot().take();
        if let Some(mut child) = child {
            if let Err(e) = child.kill().await {
                tracing::debug!(source = %self.kind, error = %e, "tool server already gone");
            }
            tracing::debug!(source = %self.kind, "tool server stopped");
        }
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let mut channel = self.channel.lock().await;
        let id = channel.next_id;
        channel.next_id += 1;

        let line = JsonRpcRequest::new(method, params, id).to_line()?;
        tracing::debug!(source = %self.kind, method, id, "sending request");
        channel.write_line(&line).await?;

        timeout(self.request_timeout, channel.read_response(id))
            .await
            .map_err(|_| McpError::Timeout {
                method: method.to_owned(),
                timeout_secs: self.request_timeout.as_secs(),
            })?
            .map_err(|e| match e {
                McpError::Protocol(message) => McpError::Protocol(format!("{method}: {message}")),
                other => other,
            })
    }

    async fn notify(&self, method: &str) -> Result<(), McpError> {
        let line = JsonRpcRequest::notification(method).to_line()?;
        self.channel.lock().await.write_line(&line).await
    }

    fn child_slot(&self) -> std::sync::MutexGuard<'_, Option<Child>> {
        self.child
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for McpConnection {
    fn drop(&mut self) {
        let slot = self
            .child
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(child) = slot.as_mut() {
            let _ = child.start_kill();
            tracing::debug!(source = %self.kind, "killed tool server on drop");
        }
    }
}

impl Channel {
    async fn write_line(&mut self, line: &str) -> Result<(), McpError> {
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(map_write_error)?;
        self.writer.flush().await.map_err(map_write_error)
    }

    /// Reads until the response for `expected_id`. Notifications, server
    /// requests, stale responses and non-JSON lines are skipped.
    async fn read_response(&mut self, expected_id: u64) -> Result<Value, McpError> {
        loop {
            let line = self.read_line().await?;
            let message = match ServerMessage::parse(&line) {
                Ok(message) => message,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unparseable server output");
                    continue;
                }
            };

            match message {
                ServerMessage::Notification { method } => {
                    tracing::debug!(method, "skipping server notification");
                }
                ServerMessage::Response { id, result } if id == expected_id => return Ok(result),
                ServerMessage::Error { id, error } if id == expected_id => {
                    return Err(McpError::Protocol(format!(
                        "server error {}: {}",
                        error.code, error.message
                    )));
                }
                ServerMessage::Response { id, .. } | ServerMessage::Error { id, .. } => {
                    tracing::debug!(id, expected_id, "skipping stale response");
                }
            }
        }
    }

    async fn read_line(&mut self) -> Result<String, McpError> {
        let mut line = String::new();
        let bound = (MAX_LINE_BYTES + 1) as u64;
        let n = (&mut self.reader)
            .take(bound)
            .read_line(&mut line)
            .await
            .map_err(|e| McpError::Protocol(format!("stdout read error: {e}")))?;

        if n == 0 {
            return Err(McpError::ProcessExited);
        }
        if line.len() > MAX_LINE_BYTES {
            return Err(McpError::OutputTooLarge {
                max_bytes: MAX_LINE_BYTES,
            });
        }
        Ok(line)
    }
}

fn map_write_error(err: std::io::Error) -> McpError {
    if err.kind() == std::io::ErrorKind::BrokenPipe {
        McpError::ProcessExited
    } else {
        McpError::Protocol(format!("stdin write error: {err}"))
    }
}

fn forward_stderr(kind: SourceKind, stderr: tokio::process::ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(source = %kind, "{line}");
        }
    });
}

#[async_trait]
impl ToolInvoker for McpConnection {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput, SourceError> {
        Ok(self.call(name, arguments).await?)
    }

    async fn list_tools(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.tools().await?)
    }
}
