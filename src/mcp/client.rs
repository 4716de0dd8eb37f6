//! MCP client — spawns tool-server processes and talks JSON-RPC over their
//! stdio, plus the multi-server bootstrap that merges advertised tools.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::error::{ConfigError, Error, McpError};
use crate::llm::ToolDefinition;
use crate::mcp::protocol::{methods, ToolsCallResult, ToolsListResult, MCP_PROTOCOL_VERSION};
use crate::tools::ToolOutcome;

/// Bounded wait for one request/response round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection target for one tool server.
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
}

impl McpServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line, e.g. "python server.py".
    pub fn from_command_line(name: impl Into<String>, cmdline: &str) -> Result<Self, ConfigError> {
        let name = name.into();
        let mut parts = cmdline.split_whitespace().map(String::from);
        let command = parts.next().ok_or_else(|| ConfigError::InvalidValue {
            key: name.clone(),
            message: "empty server command line".into(),
        })?;
        Ok(Self {
            name,
            command,
            args: parts.collect(),
        })
    }
}

/// Client for a single spawned tool-server process.
pub struct McpClient {
    server_name: String,
    tx: mpsc::UnboundedSender<String>,
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>,
    next_id: AtomicU64,
    child: Mutex<Child>,
}

impl McpClient {
    /// Spawn the server process and perform the MCP handshake.
    pub async fn spawn(config: &McpServerConfig) -> Result<Self, McpError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| McpError::Spawn(format!("{} ({})", e, config.command)))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Spawn("missing stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Spawn("missing stdout".into()))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        // Writer task: one JSON-RPC message per newline-terminated line.
        tokio::spawn(async move {
            let mut writer = stdin;
            while let Some(line) = rx.recv().await {
                let line = line.replace('\n', "");
                if writer.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if writer.write_all(b"\n").await.is_err() {
                    break;
                }
                let _ = writer.flush().await;
            }
        });

        // Reader task: route responses to waiters by id.
        let pending_reader = Arc::clone(&pending);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let parsed: Value = match serde_json::from_str(line) {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                if let Some(id) = parsed.get("id").and_then(|x| x.as_u64()) {
                    if let Some(waiter) = pending_reader.lock().await.remove(&id) {
                        let _ = waiter.send(parsed);
                    }
                }
            }
        });

        let client = Self {
            server_name: config.name.clone(),
            tx,
            pending,
            next_id: AtomicU64::new(1),
            child: Mutex::new(child),
        };

        client.initialize().await?;
        Ok(client)
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    async fn initialize(&self) -> Result<(), McpError> {
        let response = self
            .request(
                methods::INITIALIZE,
                json!({
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                }),
            )
            .await?;
        if let Some(error) = response.get("error") {
            return Err(McpError::Protocol(format!("initialize failed: {}", error)));
        }

        self.notify(methods::INITIALIZED)?;
        tracing::debug!(server = %self.server_name, "MCP handshake complete");
        Ok(())
    }

    fn notify(&self, method: &str) -> Result<(), McpError> {
        let line = serde_json::to_string(&json!({"jsonrpc": "2.0", "method": method}))?;
        self.tx
            .send(line)
            .map_err(|_| McpError::TransportClosed("writer task ended".into()))
    }

    /// Send one request and wait for the matching response.
    async fn request(&self, method: &str, params: Value) -> Result<Value, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let (waiter_tx, waiter_rx) = oneshot::channel();
        self.pending.lock().await.insert(id, waiter_tx);

        let line = serde_json::to_string(&message)?;
        if self.tx.send(line).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(McpError::TransportClosed("writer task ended".into()));
        }

        let response = tokio::time::timeout(REQUEST_TIMEOUT, waiter_rx.map(|r| r.ok())).await;
        match response {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(McpError::TransportClosed(
                "server closed before answering".into(),
            )),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(McpError::RequestTimeout(REQUEST_TIMEOUT))
            }
        }
    }

    /// Fetch all advertised tool descriptors.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>, McpError> {
        let response = self.request(methods::TOOLS_LIST, json!({})).await?;
        if let Some(error) = response.get("error") {
            return Err(server_error(error));
        }
        let result = response
            .get("result")
            .ok_or_else(|| McpError::Protocol("missing result in tools/list".into()))?;
        let parsed: ToolsListResult = serde_json::from_value(result.clone())?;
        Ok(parsed.tools.into_iter().map(Into::into).collect())
    }

    /// Invoke one tool. Tool failures come back as `Ok(Failure)`; only
    /// transport/protocol breakage is an `Err`.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<ToolOutcome, McpError> {
        let response = self
            .request(
                methods::TOOLS_CALL,
                json!({"name": name, "arguments": arguments}),
            )
            .await?;
        if let Some(error) = response.get("error") {
            return Err(server_error(error));
        }
        let result = response
            .get("result")
            .ok_or_else(|| McpError::Protocol("missing result in tools/call".into()))?;
        let parsed: ToolsCallResult = serde_json::from_value(result.clone())?;
        Ok(parsed.into_outcome())
    }

    /// Terminate the server process.
    pub async fn shutdown(&self) {
        let _ = self.request(methods::SHUTDOWN, json!({})).await;
        let mut child = self.child.lock().await;
        let _ = child.kill().await;
        tracing::debug!(server = %self.server_name, "Tool server stopped");
    }
}

fn server_error(error: &Value) -> McpError {
    McpError::Server {
        code: error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1),
        message: error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown server error")
            .to_string(),
    }
}

/// Merged view over one or more tool servers.
///
/// Connection lifetime is scoped to one agent run: connect at bootstrap,
/// shut every server down when the run completes.
pub struct McpToolSet {
    clients: Vec<McpClient>,
    definitions: Vec<ToolDefinition>,
    routes: HashMap<String, usize>,
}

impl McpToolSet {
    /// Connect to every configured server and merge their registries.
    ///
    /// An unreachable server or a duplicate tool name across servers is a
    /// configuration error and fatal at startup.
    pub async fn connect(configs: &[McpServerConfig]) -> Result<Self, Error> {
        let mut clients: Vec<McpClient> = Vec::new();
        let mut definitions = Vec::new();
        let mut routes: HashMap<String, usize> = HashMap::new();

        for config in configs {
            let client = McpClient::spawn(config).await.map_err(|e| {
                Error::Config(ConfigError::ServerUnreachable {
                    name: config.name.clone(),
                    reason: e.to_string(),
                })
            })?;

            let tools = client.list_tools().await.map_err(|e| {
                Error::Config(ConfigError::ServerUnreachable {
                    name: config.name.clone(),
                    reason: format!("tools/list failed: {}", e),
                })
            })?;

            let index = clients.len();
            for def in tools {
                if let Some(&owner) = routes.get(&def.name) {
                    let first = if owner == index {
                        config.name.clone()
                    } else {
                        clients[owner].server_name().to_string()
                    };
                    // Release child processes before bailing out.
                    clients.push(client);
                    let set = Self {
                        clients,
                        definitions,
                        routes,
                    };
                    set.shutdown().await;
                    return Err(Error::Config(ConfigError::DuplicateTool {
                        tool: def.name,
                        first,
                        second: config.name.clone(),
                    }));
                }
                routes.insert(def.name.clone(), index);
                definitions.push(def);
            }

            tracing::info!(
                server = %config.name,
                tools = routes.values().filter(|&&i| i == index).count(),
                "Connected to tool server"
            );
            clients.push(client);
        }

        Ok(Self {
            clients,
            definitions,
            routes,
        })
    }

    /// All merged tool descriptors.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }

    /// Names of all merged tools, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Route an invocation to the owning server.
    ///
    /// Unknown tools and transport failures mid-run are folded into failed
    /// outcomes so the reasoning model can react to them.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> ToolOutcome {
        let index = match self.routes.get(name) {
            Some(&index) => index,
            None => {
                return ToolOutcome::failure(format!(
                    "Tool '{}' not found. Available tools: {}",
                    name,
                    self.tool_names().join(", ")
                ));
            }
        };

        match self.clients[index].call_tool(name, arguments).await {
            Ok(outcome) => outcome,
            Err(e) => ToolOutcome::failure(format!("Tool '{}' call failed: {}", name, e)),
        }
    }

    /// Release all server connections.
    pub async fn shutdown(&self) {
        for client in &self.clients {
            client.shutdown().await;
        }
    }
}
