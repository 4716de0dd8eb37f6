//! Configuration types.

use crate::error::ConfigError;
use crate::mcp::McpServerConfig;

/// Default system prompt for the interactive agents.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools to \
    answer questions about math, weather, and US cities. If a tool reports an error, explain the \
    problem to the user instead of guessing.";

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Agent name for identification.
    pub name: String,
    /// Maximum reasoning/acting round trips per user query.
    pub max_turns: usize,
    /// System prompt prepended to every run.
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "tool-agent".to_string(),
            max_turns: 8,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

impl AgentConfig {
    /// Apply optional environment overrides to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("AGENT_MAX_TURNS") {
            config.max_turns = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "AGENT_MAX_TURNS".into(),
                message: format!("'{}' is not a positive integer", raw),
            })?;
            if config.max_turns == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "AGENT_MAX_TURNS".into(),
                    message: "must be at least 1".into(),
                });
            }
        }

        if let Ok(prompt) = std::env::var("AGENT_SYSTEM_PROMPT") {
            config.system_prompt = Some(prompt);
        }

        Ok(config)
    }
}

/// Connection target for the math server: `MCP_MATH_SERVER` override, or
/// the sibling binary next to the current executable.
pub fn math_server_config() -> Result<McpServerConfig, ConfigError> {
    server_config("math", "MCP_MATH_SERVER", "math-server")
}

/// Connection target for the weather server.
pub fn weather_server_config() -> Result<McpServerConfig, ConfigError> {
    server_config("weather", "MCP_WEATHER_SERVER", "weather-server")
}

fn server_config(name: &str, env_var: &str, sibling: &str) -> Result<McpServerConfig, ConfigError> {
    match std::env::var(env_var) {
        Ok(cmdline) => McpServerConfig::from_command_line(name, &cmdline),
        Err(_) => Ok(McpServerConfig::new(name, sibling_command(sibling), Vec::new())),
    }
}

/// Resolve a binary that lives next to the current executable, falling back
/// to PATH lookup by bare name.
fn sibling_command(bin: &str) -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(bin)))
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| bin.to_string())
}
