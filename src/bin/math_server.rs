//! Math tool server — serves arithmetic tools over MCP stdio.

use tool_agent::mcp::McpServer;
use tool_agent::tools::{math, ToolRegistry};

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
    math::register_server_tools(&mut registry);

    tracing::info!("Starting math tool server (stdio)");
    McpServer::new("math", registry).serve_stdio().await?;
    Ok(())
}
