//! Tool invocation boundary for sources reached through MCP servers.
//!
//! A [`ToolInvoker`] is a connection to one external tool server. The
//! search crate only needs two calls: list the tools once for diagnostics,
//! and call a named tool with JSON arguments. The transport lives outside
//! this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// One content item of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Plain text, usually a JSON document produced by the tool.
    Text {
        /// The text payload.
        text: String,
    },
    /// Images, resources and anything else this crate does not read.
    #[serde(other)]
    Other,
}

/// Result of a tool call, shaped like an MCP `CallToolResult`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Content items in the order the tool produced them.
    #[serde(default)]
    pub content: Vec<ToolContent>,
    /// Set when the tool itself reports failure.
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolOutput {
    /// Builds a successful output with a single text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Iterates over the text items, skipping other content.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|c| match c {
            ToolContent::Text { text } => Some(text.as_str()),
            ToolContent::Other => None,
        })
    }

    /// Converts an error-flagged output into [`SourceError::Tool`].
    pub fn into_result(self, tool_name: &str) -> Result<Self, SourceError> {
        if self.is_error {
            let detail: String = self.texts().collect::<Vec<_>>().join(" ");
            return Err(SourceError::Tool(format!("{tool_name} reported an error: {detail}")));
        }
        Ok(self)
    }
}

/// A connection able to invoke tools on an external server.
///
/// Implementations that wrap a single persistent connection must make
/// concurrent calls safe themselves (e.g. by serializing them).
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Invoke `name` with JSON `arguments`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Tool`] if the call cannot be delivered or
    /// answered.
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, SourceError>;

    /// List the names of the tools the server exposes.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Tool`] if the server cannot be queried.
    async fn list_tools(&self) -> Result<Vec<String>, SourceError>;
}
