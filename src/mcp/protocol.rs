//! JSON-RPC 2.0 message types for MCP stdio servers.
//!
//! Messages are newline-delimited JSON on the child's stdin/stdout.
//!
//! # Handshake
//!
//! ```json
//! {"jsonrpc":"2.0","method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"eagleeye","version":"0.1.0"}},"id":1}
//! ```
//!
//! followed, once the server answers, by the notification
//!
//! ```json
//! {"jsonrpc":"2.0","method":"notifications/initialized"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::McpError;

/// The JSON-RPC version string. Always `"2.0"`.
const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision requested during the handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Method name for the handshake request.
pub const METHOD_INITIALIZE: &str = "initialize";

/// Notification sent after a successful handshake.
pub const METHOD_INITIALIZED: &str = "notifications/initialized";

/// Method listing the server's tools.
pub const METHOD_TOOLS_LIST: &str = "tools/list";

/// Method invoking one tool.
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// A JSON-RPC 2.0 request or notification (sent to the server).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// The method name to invoke.
    pub method: String,
    /// Optional parameters for the method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Request identifier; `None` for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl JsonRpcRequest {
    /// Creates a request expecting a response.
    pub fn new(method: &str, params: Option<Value>, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            method: method.to_owned(),
            params,
            id: Some(id),
        }
    }

    /// Creates a notification (no response expected).
    pub fn notification(method: &str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            method: method.to_owned(),
            params: None,
            id: None,
        }
    }

    /// Serializes this message to a JSON line (with trailing newline).
    pub fn to_line(&self) -> Result<String, McpError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code (negative for standard errors).
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// An incoming message from the server.
#[derive(Debug, Clone)]
pub enum ServerMessage {
    /// A successful response.
    Response {
        /// Correlation id.
        id: u64,
        /// Result payload.
        result: Value,
    },
    /// An error response.
    Error {
        /// Correlation id.
        id: u64,
        /// Error object.
        error: JsonRpcError,
    },
    /// A notification or server-initiated request; never answered here.
    Notification {
        /// Method name.
        method: String,
    },
}

impl ServerMessage {
    /// Parses a JSON line into a server message.
    ///
    /// Determines the variant by the presence of `method`, `result` and
    /// `error`. A message with both `method` and `id` is a server-initiated
    /// request and is reported as a notification.
    pub fn parse(line: &str) -> Result<Self, McpError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(McpError::Protocol("empty message line".to_owned()));
        }

        let value: Value = serde_json::from_str(trimmed)?;

        let version = value.get("jsonrpc").and_then(Value::as_str);
        if version != Some(JSONRPC_VERSION) {
            return Err(McpError::Protocol(format!(
                "expected jsonrpc version \"{JSONRPC_VERSION}\", got {version:?}"
            )));
        }

        if let Some(method) = value.get("method").and_then(Value::as_str) {
            return Ok(Self::Notification {
                method: method.to_owned(),
            });
        }

        let id = value
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| McpError::Protocol("response without numeric id".to_owned()))?;

        if let Some(error) = value.get("error") {
            let error: JsonRpcError = serde_json::from_value(error.clone())?;
            return Ok(Self::Error { id, error });
        }
        match value.get("result") {
            Some(result) => Ok(Self::Response {
                id,
                result: result.clone(),
            }),
            None => Err(McpError::Protocol(
                "message has id but neither result nor error field".to_owned(),
            )),
        }
    }
}

/// Parameters of the `initialize` request.
pub fn initialize_params() -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": "eagleeye",
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

/// Result of `tools/list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsListResult {
    /// Tools exposed by the server.
    #[serde(default)]
    pub tools: Vec<ToolInfo>,
}

/// One entry of `tools/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn request_serializes_with_id() {
        let line = JsonRpcRequest::new(METHOD_TOOLS_LIST, None, 7)
            .to_line()
            .unwrap();
        assert!(line.ends_with('\n'));
        let value: Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "tools/list");
        assert_eq!(value["id"], 7);
        assert!(value.get("params").is_none());
    }

    #[test]
    fn notification_has_no_id() {
        let line = JsonRpcRequest::notification(METHOD_INITIALIZED)
            .to_line()
            .unwrap();
        let value: Value = serde_json::from_str(line.trim()).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["method"], "notifications/initialized");
    }

    #[test]
    fn parse_response() {
        let msg = ServerMessage::parse(r#"{"jsonrpc":"2.0","id":3,"result":{"tools":[]}}"#).unwrap();
        assert!(matches!(msg, ServerMessage::Response { id: 3, .. }));
    }

    #[test]
    fn parse_error_response() {
        let msg = ServerMessage::parse(
            r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        match msg {
            ServerMessage::Error { id, error } => {
                assert_eq!(id, 4);
                assert_eq!(error.code, -32601);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_notification_and_server_request() {
        let note = ServerMessage::parse(
            r#"{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info"}}"#,
        )
        .unwrap();
        assert!(matches!(note, ServerMessage::Notification { .. }));

        let request =
            ServerMessage::parse(r#"{"jsonrpc":"2.0","id":99,"method":"roots/list"}"#).unwrap();
        assert!(matches!(request, ServerMessage::Notification { method } if method == "roots/list"));
    }

    #[test]
    fn parse_rejects_wrong_version_and_garbage() {
        assert!(ServerMessage::parse(r#"{"jsonrpc":"1.0","id":1,"result":{}}"#).is_err());
        assert!(ServerMessage::parse("Starting server on stdio...").is_err());
        assert!(ServerMessage::parse("   ").is_err());
        assert!(ServerMessage::parse(r#"{"jsonrpc":"2.0","id":1}"#).is_err());
    }

    #[test]
    fn tools_list_result_deserializes() {
        let result: ToolsListResult = serde_json::from_value(serde_json::json!({
            "tools": [{"name": "search_issues", "inputSchema": {}}, {"name": "get_issue"}]
        }))
        .unwrap();
        let names: Vec<_> = result.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["search_issues", "get_issue"]);
    }

    #[test]
    fn initialize_params_name_protocol_version() {
        let params = initialize_params();
        assert_eq!(params["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(params["clientInfo"]["name"], "eagleeye");
    }
}
