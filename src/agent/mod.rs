//! Agent-driven search.
//!
//! An external agent process decides which source tools to call and writes
//! the final answer. This module launches it, reads its event stream and
//! turns tool activity into [`eagleeye_search::SearchProgress`] updates.
//!
//! - [`messages`]: the agent's newline-delimited JSON events.
//! - [`runtime`]: the [`AgentRuntime`] seam and the CLI-backed runtime.
//! - [`search_agent`]: the [`SearchAgent`] progress state machine.

pub mod messages;
pub mod prompt;
pub mod runtime;
pub mod search_agent;

pub use messages::{AgentMessage, ContentBlock};
pub use runtime::{AgentMessageStream, AgentOptions, AgentRuntime, ClaudeCliRuntime};
pub use search_agent::{NO_RESULTS_MESSAGE, SearchAgent};

/// Errors from the agent process.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The agent executable could not be started.
    #[error("failed to start agent `{command}`: {source}")]
    Spawn {
        /// The executable that failed to start.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the agent's output failed.
    #[error("agent stream error: {0}")]
    Stream(String),

    /// The agent reported failure or exited abnormally.
    #[error("agent failed: {0}")]
    Failed(String),

    /// The agent's output could not be interpreted.
    #[error("agent protocol error: {0}")]
    Protocol(String),
}
