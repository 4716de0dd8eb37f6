//! Interactive agent with in-process tools (math, weather, city info).

use std::sync::Arc;

use tool_agent::agent::AgentLoop;
use tool_agent::config::AgentConfig;
use tool_agent::llm::{create_provider, LlmConfig};
use tool_agent::repl;
use tool_agent::tools::city::GetCityInfoTool;
use tool_agent::tools::math::CalculateTool;
use tool_agent::tools::weather::{GetCityWeatherTool, NwsClient};
use tool_agent::tools::ToolRegistry;

const DEMO_QUERIES: &[&str] = &[
    "What's the weather in Denver?",
    "Calculate 25 plus 17",
    "Tell me about Chicago",
    "What's 15 times 8?",
];

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

    // Missing credentials are fatal at startup, not at first query.
    let llm_config = LlmConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let agent_config = AgentConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let llm = create_provider(&llm_config)?;

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GetCityWeatherTool::new(Arc::new(NwsClient::new()))));
    registry.register(Arc::new(CalculateTool));
    registry.register(Arc::new(GetCityInfoTool));

    eprintln!("Basic Agent Demo v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm.model());
    eprintln!("   Tools: {}", registry.list().join(", "));

    let mut agent = AgentLoop::new(llm, Arc::new(registry)).with_max_turns(agent_config.max_turns);
    if let Some(prompt) = agent_config.system_prompt {
        agent = agent.with_system_prompt(prompt);
    }

    if demo {
        for query in DEMO_QUERIES {
            println!("\nQuery: {}", query);
            let report = agent.run(query).await;
            println!("{}", report.outcome.user_text());
        }
        return Ok(());
    }

    eprintln!("   Type a question, or 'quit' to exit.\n");
    let agent = &agent;
    repl::run(|line| async move {
        let report = agent.run(&line).await;
        println!("\n{}\n", report.outcome.user_text());
    })
    .await?;

    Ok(())
}
