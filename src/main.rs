use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use switchbot_ac::mcp::{McpServer, router};
use switchbot_ac::{AcController, AcTools, Config};
use tracing_subscriber::EnvFilter;

/// MCP server relaying air-conditioner commands to a SwitchBot Hub 2.
#[derive(Debug, Parser)]
#[command(name = "switchbot-mcp", version)]
struct Args {
    /// TOML config file (defaults to ./config.toml when present).
    #[arg(short, long, env = "SWITCHBOT_AC_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "MCP_HTTP_HOST")]
    host: Option<String>,

    #[arg(long, env = "MCP_HTTP_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("switchbot_ac=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let client = config.switchbot.client_builder().build()?;
    let controller = AcController::new(client, config.switchbot.device_id.clone(), config.defaults);
    let server = Arc::new(McpServer::new(
        AcTools::new(controller),
        config.server.api_key.clone(),
    ));

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        device_id = %config.switchbot.device_id,
        "MCP server listening"
    );
    axum::serve(listener, router(server)).await?;
    Ok(())
}
