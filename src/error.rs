//! Error types for the tool agent.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool error: {0}")]
    Tool(#[from] crate::tools::ToolError),

    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors. Fatal at startup; the process exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Tool server {name} unreachable: {reason}")]
    ServerUnreachable { name: String, reason: String },

    #[error("Tool {tool} advertised by both {first} and {second}; tool names must be unique across servers")]
    DuplicateTool {
        tool: String,
        first: String,
        second: String,
    },
}

/// LLM provider errors. A failed model call terminates the current run with
/// an error annotation; there are no automatic retries.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned HTTP {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Provider {provider} rate limited")]
    RateLimited { provider: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout {
        provider: String,
        timeout: Duration,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// MCP transport and protocol errors.
///
/// Transport failures mid-run are folded into the conversation as failed
/// tool results; only connection setup is fatal.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("Failed to spawn server process: {0}")]
    Spawn(String),

    #[error("Transport closed: {0}")]
    TransportClosed(String),

    #[error("Request timed out after {0:?}")]
    RequestTimeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;
