//! Weather tool server — serves NWS-backed weather tools over MCP stdio.

use std::sync::Arc;

use tool_agent::mcp::McpServer;
use tool_agent::tools::weather::{self, NwsClient};
use tool_agent::tools::ToolRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is the transport; all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut registry = ToolRegistry::new();
    weather::register_server_tools(&mut registry, Arc::new(NwsClient::new()));

    tracing::info!("Starting weather tool server (stdio)");
    McpServer::new("weather", registry).serve_stdio().await?;
    Ok(())
}
