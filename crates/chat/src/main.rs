use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tally_chat::{AnthropicClient, ChatConfig, Orchestrator, StdioSurface};
use tally_mcp::catalog::DocsProfile;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Natural-language todo manager backed by MCP tools", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tally.toml")]
    config: PathBuf,

    /// Command used to launch the MCP tool server
    #[arg(long, default_value = "tally-mcp")]
    server_cmd: String,

    /// Tool documentation profile passed to the server:
    /// 'descriptive' or 'terse'
    #[arg(long, default_value = "descriptive")]
    docs: DocsProfile,

    /// Override the model id from the config
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=info".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = ChatConfig::load(&args.config)?;
    if let Some(model) = args.model {
        config.model = model;
    }
    let api_key = ChatConfig::api_key_from_env()?;
    let client = Arc::new(AnthropicClient::new(&config, &api_key)?);

    println!("Tally Todo Chat");
    println!("{}", "=".repeat(50));
    println!("Connecting to todo server ({} docs)...", args.docs);

    let surface = Arc::new(
        StdioSurface::connect(
            &args.server_cmd,
            &["--docs".to_string(), args.docs.to_string()],
        )
        .await?,
    );

    let mut orchestrator =
        Orchestrator::new(client, surface).with_max_rounds(config.max_tool_rounds);

    println!("\nI can help you manage your todos. Try things like:");
    println!("- 'Add a todo to buy groceries'");
    println!("- 'Show me all my todos'");
    println!("- 'Mark todo 1 as complete'");
    println!("- 'Delete the shopping todo'");
    println!("\nType 'quit' to exit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "bye") {
            println!("Goodbye! Your todos live only in this session.");
            break;
        }

        // Turn-level failures are printed and the session keeps going.
        match orchestrator.handle_turn(input).await {
            Ok(reply) => println!("Assistant: {}\n", reply),
            Err(err) => println!("Error: {}\n", err),
        }
    }

    Ok(())
}
