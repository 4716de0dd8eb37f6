//! Interactive agent whose tools live in separate MCP server processes.

use std::sync::Arc;

use tool_agent::agent::{AgentLoop, ToolSource};
use tool_agent::config::{self, AgentConfig};
use tool_agent::llm::{create_provider, LlmConfig};
use tool_agent::mcp::McpToolSet;
use tool_agent::repl;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let demo = std::env::args().any(|arg| arg == "--demo");

    let servers = vec![
        config::math_server_config().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        config::weather_server_config().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
    ];

    // An unreachable server or a duplicate tool name is fatal at startup.
    let toolset = match McpToolSet::connect(&servers).await {
        Ok(toolset) => Arc::new(toolset),
        Err(e) => {
            eprintln!("Error: failed to connect to MCP servers: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Interactive MCP Agent v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Connected to MCP servers");
    eprintln!("   Tools: {}", toolset.tool_names().join(", "));

    if demo {
        // Quick test: exercise one tool on each server directly.
        let outcome = toolset
            .invoke("add", &serde_json::json!({"a": 5, "b": 3}))
            .await;
        println!("Math test: 5 + 3 = {}", outcome.render());

        let outcome = toolset
            .invoke(
                "get_city_weather",
                &serde_json::json!({"city_name": "san francisco"}),
            )
            .await;
        let preview: String = outcome.render().chars().take(100).collect();
        println!("Weather test: {}...", preview);

        toolset.shutdown().await;
        return Ok(());
    }

    let llm_config = LlmConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let agent_config = AgentConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let llm = create_provider(&llm_config)?;
    eprintln!("   Model: {}", llm.model());

    let mut agent = AgentLoop::new(llm, Arc::clone(&toolset) as Arc<dyn ToolSource>)
        .with_max_turns(agent_config.max_turns);
    if let Some(prompt) = agent_config.system_prompt {
        agent = agent.with_system_prompt(prompt);
    }

    eprintln!("   Type a question, or 'quit' to exit.\n");

    let agent = &agent;
    repl::run(|line| async move {
        let report = agent.run(&line).await;
        println!("\n{}\n", report.outcome.user_text());
    })
    .await?;

    // Connections are scoped to this run.
    toolset.shutdown().await;
    Ok(())
}
