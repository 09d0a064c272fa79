//! `postman-mcp`: MCP server (stdio) exposing a single HTTP request tool.

mod server;

use clap::{Parser, ValueEnum};
use postman_mcp_http_relay::HttpRelay;
use rmcp::ServiceExt as _;
use rmcp::transport::stdio;
use server::RelayServer;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "postman-mcp", version, about)]
struct Cli {
    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "POSTMAN_MCP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format. Logs always go to stderr; stdout carries the protocol.
    #[arg(long, env = "POSTMAN_MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run() -> anyhow::Result<()> {
    let server = RelayServer::new(HttpRelay::new());
    let service = server.serve(stdio()).await?;
    tracing::info!("Postman MCP Server running on stdio");

    let reason = service.waiting().await?;
    tracing::debug!(?reason, "stdio session closed");
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Fatal error in main()");
        std::process::exit(1);
    }
}
