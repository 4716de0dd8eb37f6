//! Scheduled weather report — one non-interactive agent run whose answer is
//! appended to a report file. Meant to be driven by an external scheduler.

use std::sync::Arc;

use tool_agent::agent::{AgentLoop, LoopOutcome, ToolSource};
use tool_agent::config;
use tool_agent::llm::{create_provider, CompletionOptions, LlmConfig};
use tool_agent::mcp::McpToolSet;
use tool_agent::report::ReportWriter;

/// Cities covered by the report.
const US_CITIES: &[&str] = &[
    "New York",
    "Los Angeles",
    "Chicago",
    "Houston",
    "Phoenix",
    "Philadelphia",
    "San Antonio",
    "San Diego",
    "Dallas",
    "Denver",
];

/// Ten cities need well over the interactive turn cap.
const REPORT_MAX_TURNS: usize = 24;

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

    let servers = vec![config::weather_server_config().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })];

    let toolset = match McpToolSet::connect(&servers).await {
        Ok(toolset) => Arc::new(toolset),
        Err(e) => {
            eprintln!("Error: failed to connect to weather server: {}", e);
            std::process::exit(1);
        }
    };

    if demo {
        // Single-city check of the MCP path, no model involved.
        let outcome = toolset
            .invoke(
                "get_city_weather",
                &serde_json::json!({"city_name": "San Francisco"}),
            )
            .await;
        println!("San Francisco weather result:\n{}", outcome.render());
        toolset.shutdown().await;
        return Ok(());
    }

    let llm_config = LlmConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let llm = create_provider(&llm_config)?;

    let report_path = std::env::var("WEATHER_REPORT_PATH")
        .unwrap_or_else(|_| "weather_summary.txt".to_string());
    let writer = ReportWriter::new(&report_path);

    let cities = US_CITIES.join(", ");
    let prompt = format!(
        "Generate a comprehensive weather report for these major US cities: {}.\n\n\
         For each city:\n\
         1. Use the get_city_weather tool to get the weather forecast\n\
         2. Present the information with each city's weather clearly separated\n\
         3. Include temperature, conditions, and forecast details\n\n\
         Format the output as a clean summary with clear headings for each city.",
        cities
    );

    let agent = AgentLoop::new(llm, Arc::clone(&toolset) as Arc<dyn ToolSource>)
        .with_max_turns(REPORT_MAX_TURNS)
        .with_options(CompletionOptions {
            max_tokens: 4000,
            ..Default::default()
        });

    tracing::info!(cities = US_CITIES.len(), "Generating weather report");
    let run = agent.run(&prompt).await;
    toolset.shutdown().await;

    match run.outcome {
        LoopOutcome::Answer(text) => {
            println!("{}", text);
            writer.append("MCP 10-City Weather", &text).await?;
            tracing::info!(path = %report_path, "Report appended");
            Ok(())
        }
        other => {
            eprintln!("Error: {}", other.user_text());
            std::process::exit(1);
        }
    }
}
