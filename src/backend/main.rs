/**
 * Chat Server Entry Point
 *
 * Loads `.env`, initializes tracing, reads configuration and serves the
 * application until Ctrl+C.
 */

use std::path::PathBuf;

use clap::Parser;

use chatline::backend::server::{create_app, ServerConfig};

/// Real-time chat server
#[derive(Debug, Parser)]
#[command(name = "chatline-server", version, about)]
struct Cli {
    /// Port to listen on, overrides SERVER_PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML configuration file; environment variables take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,chatline=debug"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let mut config = ServerConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = create_app(config).await;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
