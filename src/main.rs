//! `wrap-demo`: exercises the interception layer's literal end-to-end
//! scenarios (echo, short-circuit, ordering) against an in-memory server,
//! so the pipeline is runnable and observable outside of `cargo test`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use mcp_proxy_wrapper::config::DemoConfig;
use mcp_proxy_wrapper::{tool_handler, wrap, wrap_tool, ToolHandler, WrapOptions};
use mock_server::MockServer;
use proxy_core::{ContentPart, ToolCallContext, ToolCallResult};
use proxy_security::SecurityConfig;
use serde_json::{json, Map, Value};

/// Which built-in scenario to run.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// A plain call through one logging plugin.
    Echo,
    /// A denylist plugin short-circuits the call before the handler runs.
    ShortCircuit,
    /// Two plugins with different priorities, showing before/after order.
    Ordering,
}

#[derive(Debug, Parser)]
#[command(name = "wrap-demo", about = "Exercise the MCP tool-call interception layer")]
struct Cli {
    /// Which scenario to run.
    #[arg(value_enum, default_value_t = Scenario::Echo)]
    scenario: Scenario,

    /// Un-redact error messages and enable verbose logging.
    #[arg(long)]
    debug: bool,

    /// Field names to redact before any plugin sees the call's arguments.
    #[arg(long = "redact")]
    redact_fields: Vec<String>,

    /// Path to an optional TOML config file (default: ./wrap-demo.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn echo_handler() -> ToolHandler {
    tool_handler(|ctx: ToolCallContext| async move {
        let args = ctx.snapshot_args();
        Ok(ToolCallResult {
            content: vec![ContentPart::json(Value::Object(args))],
            is_error: false,
            meta: None,
        })
    })
}

async fn run_echo(security: SecurityConfig) -> Result<()> {
    let server = Arc::new(MockServer::new());
    let handle = wrap(
        server.clone(),
        WrapOptions {
            plugins: vec![Arc::new(example_plugins::LoggingPlugin::default())],
            security,
            ..Default::default()
        },
    )
    .await?;
    wrap_tool(&handle, "greet", Value::Null, echo_handler());

    let mut args = Map::new();
    args.insert("name".to_string(), json!("world"));
    let result = server.call_tool("greet", args, Map::new()).await?;
    println!("echo result: {}", serde_json::to_string_pretty(&result)?);
    handle.dispose().await;
    Ok(())
}

async fn run_short_circuit(security: SecurityConfig) -> Result<()> {
    let server = Arc::new(MockServer::new());
    let handle = wrap(
        server.clone(),
        WrapOptions {
            plugins: vec![Arc::new(example_plugins::DenylistPlugin::new(["greet"]))],
            security,
            ..Default::default()
        },
    )
    .await?;
    wrap_tool(&handle, "greet", Value::Null, echo_handler());

    let result = server.call_tool("greet", Map::new(), Map::new()).await?;
    println!("short-circuit result: {}", serde_json::to_string_pretty(&result)?);
    handle.dispose().await;
    Ok(())
}

async fn run_ordering(security: SecurityConfig) -> Result<()> {
    let server = Arc::new(MockServer::new());
    let handle = wrap(
        server.clone(),
        WrapOptions {
            plugins: vec![
                Arc::new(example_plugins::LoggingPlugin::default()),
                Arc::new(example_plugins::AuditPlugin::new()),
            ],
            security,
            ..Default::default()
        },
    )
    .await?;
    wrap_tool(&handle, "greet", Value::Null, echo_handler());

    server.call_tool("greet", Map::new(), Map::new()).await?;
    println!("ran logging (priority 0) and audit (priority 0) plugins in registration order");
    handle.dispose().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cli_overrides = DemoConfig {
        debug: cli.debug,
        redact_fields: cli.redact_fields.clone(),
        ..Default::default()
    };
    let config = DemoConfig::load(&cli_overrides, cli.config.clone())?;

    observability::init_subscriber(config.debug).ok();

    let security = SecurityConfig {
        validate_inputs: true,
        redact_fields: config.redact_fields,
        max_execution_time_ms: config.max_execution_time_ms,
    };

    match cli.scenario {
        Scenario::Echo => run_echo(security).await,
        Scenario::ShortCircuit => run_short_circuit(security).await,
        Scenario::Ordering => run_ordering(security).await,
    }
}
