//! Stdio client for MCP tool servers.
//!
//! Each active source can be backed by an external tool server launched as
//! a child process (`npx -y <package>`). This module owns those processes:
//!
//! - [`protocol`]: JSON-RPC 2.0 message types and the handshake constants.
//! - [`connection`]: one live server, implementing
//!   [`eagleeye_search::ToolInvoker`].
//! - [`pool`]: connects every configured source and tears them down.

pub mod connection;
pub mod pool;
pub mod protocol;

pub use connection::McpConnection;
pub use pool::McpPool;

/// Errors from tool server processes.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// Failed to spawn the server process.
    #[error("failed to spawn tool server `{command}`: {source}")]
    Spawn {
        /// The executable that failed to start.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The server did not answer in time.
    #[error("tool server request `{method}` timed out after {timeout_secs}s")]
    Timeout {
        /// The method that was pending.
        method: String,
        /// The timeout in seconds.
        timeout_secs: u64,
    },

    /// JSON-RPC protocol violation or error response.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server closed its pipes.
    #[error("tool server exited unexpectedly")]
    ProcessExited,

    /// A single output line exceeded the size bound.
    #[error("tool server output exceeded {max_bytes} bytes")]
    OutputTooLarge {
        /// The maximum allowed line size.
        max_bytes: usize,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<McpError> for eagleeye_search::SourceError {
    fn from(err: McpError) -> Self {
        Self::Tool(err.to_string())
    }
}
