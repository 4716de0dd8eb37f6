//! Tool source seam — the agent loop runs against either the in-process
//! registry or a merged set of MCP servers through the same interface.

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::ToolDefinition;
use crate::mcp::McpToolSet;
use crate::tools::{ToolOutcome, ToolRegistry};

/// Anything that can advertise tool descriptors and invoke tools by name.
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Descriptors advertised to the reasoning model.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Invoke a tool. All failure modes come back as a failed outcome.
    async fn invoke(&self, name: &str, arguments: &Value) -> ToolOutcome;
}

#[async_trait]
impl ToolSource for ToolRegistry {
    fn definitions(&self) -> Vec<ToolDefinition> {
        ToolRegistry::definitions(self)
    }

    async fn invoke(&self, name: &str, arguments: &Value) -> ToolOutcome {
        ToolRegistry::invoke(self, name, arguments).await
    }
}

#[async_trait]
impl ToolSource for McpToolSet {
    fn definitions(&self) -> Vec<ToolDefinition> {
        McpToolSet::definitions(self)
    }

    async fn invoke(&self, name: &str, arguments: &Value) -> ToolOutcome {
        McpToolSet::invoke(self, name, arguments).await
    }
}
