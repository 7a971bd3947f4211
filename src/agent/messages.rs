//! Events emitted by the agent CLI in `stream-json` output mode.
//!
//! One JSON object per line:
//!
//! ```json
//! {"type":"system","subtype":"init","tools":["mcp__slack__slack_list_channels"]}
//! {"type":"assistant","message":{"content":[{"type":"tool_use","id":"t1","name":"mcp__slack__slack_list_channels","input":{}}]}}
//! {"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t1","content":"..."}]}}
//! {"type":"assistant","message":{"content":[{"type":"text","text":"Found 2 threads..."}]}}
//! {"type":"result","subtype":"success","is_error":false,"num_turns":3,"result":"Found 2 threads..."}
//! ```

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::AgentError;

/// One event from the agent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentMessage {
    /// Session metadata.
    System {
        /// Event subtype, e.g. `init`.
        #[serde(default)]
        subtype: Option<String>,
    },
    /// Model output: text and tool calls.
    Assistant {
        /// Message payload.
        message: MessageBody,
    },
    /// Tool results fed back to the model.
    User {
        /// Message payload.
        message: MessageBody,
    },
    /// Final event of a run.
    Result {
        /// Final answer text, when the run produced one.
        #[serde(default)]
        result: Option<String>,
        /// Whether the run failed.
        #[serde(default)]
        is_error: bool,
        /// Turns used.
        #[serde(default)]
        num_turns: Option<u32>,
        /// Outcome, e.g. `success` or `error_max_turns`.
        #[serde(default)]
        subtype: Option<String>,
    },
    /// Any other event type.
    #[serde(other)]
    Unknown,
}

/// Content of an assistant or user message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageBody {
    /// Content blocks in order. A plain string becomes one text block.
    #[serde(default, deserialize_with = "content_blocks")]
    pub content: Vec<ContentBlock>,
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Model-written text.
    Text {
        /// The text.
        text: String,
    },
    /// A tool call requested by the model.
    ToolUse {
        /// Call id.
        #[serde(default)]
        id: String,
        /// Fully qualified tool name, e.g. `mcp__linear__linear_searchIssues`.
        name: String,
        /// Tool arguments.
        #[serde(default)]
        input: Value,
    },
    /// Output of an earlier tool call.
    ToolResult {
        /// Id of the call this answers.
        #[serde(default)]
        tool_use_id: String,
        /// Whether the tool failed.
        #[serde(default)]
        is_error: bool,
    },
    /// Thinking and other block types.
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

fn content_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawContent::deserialize(deserializer)? {
        RawContent::Text(text) => vec![ContentBlock::Text { text }],
        RawContent::Blocks(blocks) => blocks,
    })
}

impl AgentMessage {
    /// Content blocks of assistant and user messages; empty otherwise.
    pub fn content(&self) -> &[ContentBlock] {
        match self {
            Self::Assistant { message } | Self::User { message } => &message.content,
            _ => &[],
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::Assistant { .. } => "assistant",
            Self::User { .. } => "user",
            Self::Result { .. } => "result",
            Self::Unknown => "unknown",
        }
    }
}

/// Parse one output line.
///
/// # Errors
///
/// Returns [`AgentError::Protocol`] if the line is not a JSON event.
pub fn parse_line(line: &str) -> Result<AgentMessage, AgentError> {
    serde_json::from_str(line.trim())
        .map_err(|e| AgentError::Protocol(format!("invalid agent event: {e}")))
}
