// Standalone MCP server binary for the todo tools.

use anyhow::Result;
use clap::Parser;
use tally_core::TodoStore;
use tally_mcp::catalog::DocsProfile;
use tally_mcp::server::McpServer;
use tally_mcp::tools::todo_registry;

#[derive(Parser, Debug)]
#[command(name = "tally-mcp")]
#[command(about = "Todo MCP server with selectable tool-documentation quality", long_about = None)]
struct Args {
    /// Tool documentation profile: 'descriptive' or 'terse'
    #[arg(long, default_value = "descriptive")]
    docs: DocsProfile,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!(docs = %args.docs, "Tally MCP server starting");

    let store = TodoStore::shared();
    let registry = todo_registry(store, &args.docs.catalog());

    McpServer::new(registry).run().await
}
