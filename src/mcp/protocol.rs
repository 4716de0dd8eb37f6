//! MCP message types.
//!
//! MCP is JSON-RPC 2.0 with specific method names and schemas. Framing here
//! is newline-delimited JSON over the transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::ToolDefinition;
use crate::tools::ToolOutcome;

/// JSON-RPC version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version we speak.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

// ── Core message types ──────────────────────────────────────────────

/// Incoming JSON-RPC message. Notifications carry no `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Outgoing JSON-RPC response.
#[derive(Debug, Clone, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorBody>,
}

impl McpResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<RequestId>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Request ID: string or number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

/// JSON-RPC error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// Protocol-level errors a server can answer with.
#[derive(Debug, Clone)]
pub enum RpcError {
    ParseError(String),
    InvalidRequest(String),
    MethodNotFound(String),
    InvalidParams(String),
    InternalError(String),
}

impl RpcError {
    pub fn code(&self) -> i64 {
        match self {
            RpcError::ParseError(_) => -32700,
            RpcError::InvalidRequest(_) => -32600,
            RpcError::MethodNotFound(_) => -32601,
            RpcError::InvalidParams(_) => -32602,
            RpcError::InternalError(_) => -32603,
        }
    }

    pub fn message(&self) -> String {
        match self {
            RpcError::ParseError(msg) => format!("Parse error: {}", msg),
            RpcError::InvalidRequest(msg) => format!("Invalid request: {}", msg),
            RpcError::MethodNotFound(method) => format!("Method not found: {}", method),
            RpcError::InvalidParams(msg) => format!("Invalid params: {}", msg),
            RpcError::InternalError(msg) => format!("Internal error: {}", msg),
        }
    }
}

impl From<RpcError> for RpcErrorBody {
    fn from(err: RpcError) -> Self {
        RpcErrorBody {
            code: err.code(),
            message: err.message(),
        }
    }
}

// ── Method names ────────────────────────────────────────────────────

pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const SHUTDOWN: &str = "shutdown";
    pub const PING: &str = "ping";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

// ── Lifecycle messages ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    pub client_info: PeerInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: PeerInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Name/version pair identifying either side of the connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInfo {
    pub name: String,
    pub version: String,
}

// ── Tools messages ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// Wire form of a tool descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl From<&ToolDefinition> for ToolDescriptor {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            name: def.name.clone(),
            description: def.description.clone(),
            input_schema: def.parameters.clone(),
        }
    }
}

impl From<ToolDescriptor> for ToolDefinition {
    fn from(desc: ToolDescriptor) -> Self {
        Self {
            name: desc.name,
            description: desc.description,
            parameters: desc.input_schema,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCallResult {
    pub content: Vec<ToolResultContent>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "isError"
    )]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolResultContent {
    Text { text: String },
}

impl ToolsCallResult {
    /// Map an invocation outcome onto the wire: tool failures are results
    /// with `isError`, not protocol errors.
    pub fn from_outcome(outcome: &ToolOutcome) -> Self {
        Self {
            content: vec![ToolResultContent::Text {
                text: outcome.render(),
            }],
            is_error: if outcome.is_success() {
                None
            } else {
                Some(true)
            },
        }
    }

    /// Reconstruct an outcome from the wire form.
    pub fn into_outcome(self) -> ToolOutcome {
        let text = self
            .content
            .iter()
            .map(|c| match c {
                ToolResultContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n");

        if self.is_error.unwrap_or(false) {
            // Server already rendered the failure as "Error: ..." text.
            let error = text.strip_prefix("Error: ").unwrap_or(&text).to_string();
            ToolOutcome::failure(error)
        } else {
            ToolOutcome::success(Value::String(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_deserializes_both_forms() {
        let id: RequestId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id, RequestId::String("abc".into()));

        let id: RequestId = serde_json::from_str("42").unwrap();
        assert_eq!(id, RequestId::Number(42));
    }

    #[test]
    fn notification_parses_without_id() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let req: McpRequest = serde_json::from_str(raw).unwrap();
        assert!(req.id.is_none());
        assert_eq!(req.method, methods::INITIALIZED);
    }

    #[test]
    fn error_codes() {
        assert_eq!(RpcError::ParseError(String::new()).code(), -32700);
        assert_eq!(RpcError::InvalidRequest(String::new()).code(), -32600);
        assert_eq!(RpcError::MethodNotFound(String::new()).code(), -32601);
        assert_eq!(RpcError::InvalidParams(String::new()).code(), -32602);
        assert_eq!(RpcError::InternalError(String::new()).code(), -32603);
    }

    #[test]
    fn descriptor_uses_camel_case_input_schema() {
        let def = ToolDefinition {
            name: "add".into(),
            description: "Add".into(),
            parameters: serde_json::json!({"type": "object"}),
        };
        let wire = serde_json::to_value(ToolDescriptor::from(&def)).unwrap();
        assert!(wire.get("inputSchema").is_some());
        assert!(wire.get("input_schema").is_none());
    }

    #[test]
    fn outcome_roundtrip_over_call_result() {
        let ok = ToolOutcome::success(serde_json::json!("42.0"));
        let wire = ToolsCallResult::from_outcome(&ok);
        assert!(wire.is_error.is_none());
        assert!(wire.into_outcome().is_success());

        let err = ToolOutcome::failure("Cannot divide by zero");
        let wire = ToolsCallResult::from_outcome(&err);
        assert_eq!(wire.is_error, Some(true));
        match wire.into_outcome() {
            ToolOutcome::Failure { error } => assert_eq!(error, "Cannot divide by zero"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn call_result_serializes_is_error_as_camel_case() {
        let wire = ToolsCallResult::from_outcome(&ToolOutcome::failure("boom"));
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["content"][0]["type"], "text");
    }
}
