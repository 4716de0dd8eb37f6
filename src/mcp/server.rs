//! MCP tool server — exposes a [`ToolRegistry`] over a stdio transport.
//!
//! One newline-terminated JSON-RPC message per line, request/response 1:1.
//! Logging goes to stderr; stdout is the transport.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::McpError;
use crate::mcp::protocol::{
    methods, InitializeResult, McpRequest, McpResponse, PeerInfo, RpcError, ServerCapabilities,
    ToolDescriptor, ToolsCallParams, ToolsCallResult, ToolsCapability, ToolsListResult,
    MCP_PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;

/// A tool server bound to one registry.
pub struct McpServer {
    name: String,
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(name: impl Into<String>, registry: ToolRegistry) -> Self {
        Self {
            name: name.into(),
            registry: Arc::new(registry),
        }
    }

    /// Serve on stdin/stdout until EOF or shutdown.
    pub async fn serve_stdio(self) -> Result<(), McpError> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve on an arbitrary transport. Used directly by tests.
    pub async fn serve<R, W>(self, reader: R, mut writer: W) -> Result<(), McpError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(server = %self.name, tools = self.registry.count(), "Tool server listening");

        let mut lines = BufReader::new(reader).lines();
        let mut initialized = false;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (response, done) = self.handle_line(line, &mut initialized).await;
            if let Some(response) = response {
                let mut payload = serde_json::to_string(&response)?;
                payload.push('\n');
                writer.write_all(payload.as_bytes()).await?;
                writer.flush().await?;
            }
            if done {
                break;
            }
        }

        tracing::info!(server = %self.name, "Tool server shutting down");
        Ok(())
    }

    /// Handle one request line. Returns the response (None for
    /// notifications) and whether the serve loop should end.
    async fn handle_line(&self, line: &str, initialized: &mut bool) -> (Option<McpResponse>, bool) {
        let request: McpRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                return (
                    Some(McpResponse::error(None, RpcError::ParseError(e.to_string()))),
                    false,
                );
            }
        };

        let method = request.method.clone();
        let id = request.id.clone();

        // Notifications get no response.
        if method == methods::INITIALIZED {
            tracing::debug!(server = %self.name, "Client initialized");
            return (None, false);
        }

        let id = match id {
            Some(id) => id,
            None => {
                tracing::debug!(server = %self.name, method = %method, "Ignoring unknown notification");
                return (None, false);
            }
        };

        if method == methods::SHUTDOWN {
            let response = McpResponse::success(id, Value::Object(Default::default()));
            return (Some(response), true);
        }

        let result = match method.as_str() {
            methods::INITIALIZE => {
                *initialized = true;
                self.handle_initialize()
            }
            methods::PING => Ok(Value::Object(Default::default())),
            methods::TOOLS_LIST => {
                if *initialized {
                    self.handle_tools_list()
                } else {
                    Err(RpcError::InvalidRequest("Not initialized".into()))
                }
            }
            methods::TOOLS_CALL => {
                if *initialized {
                    self.handle_tools_call(request.params).await
                } else {
                    Err(RpcError::InvalidRequest("Not initialized".into()))
                }
            }
            other => Err(RpcError::MethodNotFound(other.to_string())),
        };

        let response = match result {
            Ok(value) => McpResponse::success(id, value),
            Err(error) => McpResponse::error(Some(id), error),
        };
        (Some(response), false)
    }

    fn handle_initialize(&self) -> Result<Value, RpcError> {
        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: None },
            },
            server_info: PeerInfo {
                name: self.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        serde_json::to_value(result).map_err(|e| RpcError::InternalError(e.to_string()))
    }

    fn handle_tools_list(&self) -> Result<Value, RpcError> {
        let tools: Vec<ToolDescriptor> = self
            .registry
            .definitions()
            .iter()
            .map(ToolDescriptor::from)
            .collect();
        serde_json::to_value(ToolsListResult {
            tools,
            next_cursor: None,
        })
        .map_err(|e| RpcError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, RpcError> {
        let params: ToolsCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| RpcError::InvalidParams(e.to_string()))?
            .ok_or_else(|| RpcError::InvalidParams("Missing params".into()))?;

        let arguments = params.arguments.unwrap_or_else(|| serde_json::json!({}));
        tracing::debug!(server = %self.name, tool = %params.name, "Invoking tool");

        // Unknown tools and handler failures both come back as failed
        // outcomes from the registry, never as protocol errors.
        let outcome = self.registry.invoke(&params.name, &arguments).await;

        serde_json::to_value(ToolsCallResult::from_outcome(&outcome))
            .map_err(|e| RpcError::InternalError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::math;

    fn math_server() -> McpServer {
        let mut registry = ToolRegistry::new();
        math::register_server_tools(&mut registry);
        McpServer::new("math", registry)
    }

    async fn one_line(server: &McpServer, line: &str, initialized: &mut bool) -> Option<McpResponse> {
        let (response, _) = server.handle_line(line, initialized).await;
        response
    }

    #[tokio::test]
    async fn tools_list_requires_initialize() {
        let server = math_server();
        let mut initialized = false;

        let resp = one_line(
            &server,
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
            &mut initialized,
        )
        .await
        .unwrap();
        assert!(resp.error.is_some());

        one_line(
            &server,
            r#"{"jsonrpc":"2.0","id":2,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"t","version":"0"}}}"#,
            &mut initialized,
        )
        .await
        .unwrap();

        let resp = one_line(
            &server,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#,
            &mut initialized,
        )
        .await
        .unwrap();
        let result: ToolsListResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.tools.len(), 6);
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let server = math_server();
        let mut initialized = true;
        let resp = one_line(
            &server,
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#,
            &mut initialized,
        )
        .await
        .unwrap();
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn initialized_notification_gets_no_response() {
        let server = math_server();
        let mut initialized = false;
        let resp = one_line(
            &server,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            &mut initialized,
        )
        .await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn parse_error_is_reported_without_id() {
        let server = math_server();
        let mut initialized = false;
        let resp = one_line(&server, "{not json", &mut initialized).await.unwrap();
        assert!(resp.id.is_none());
        assert_eq!(resp.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn tool_failure_is_a_result_not_a_protocol_error() {
        let server = math_server();
        let mut initialized = true;
        let resp = one_line(
            &server,
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"divide","arguments":{"a":1,"b":0}}}"#,
            &mut initialized,
        )
        .await
        .unwrap();
        assert!(resp.error.is_none());
        let result: ToolsCallResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn shutdown_ends_the_loop() {
        let server = math_server();
        let mut initialized = true;
        let (resp, done) = server
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"shutdown"}"#, &mut initialized)
            .await;
        assert!(resp.is_some());
        assert!(done);
    }
}
