//! Sisterhood sync server binary.

use clap::Parser;
use sisterhood_server::{ServerConfig, SyncServer};
use std::net::{IpAddr, SocketAddr};
use tracing_subscriber::EnvFilter;

/// In-memory sync server for users, groups, events and messages.
#[derive(Parser)]
#[command(name = "sisterhood-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on (defaults to $PORT, then 3000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Requests allowed per client IP per 15 minutes (0 disables)
    #[arg(long)]
    rate_limit: Option<u32>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = ServerConfig::from_env()?;
    let port = cli.port.unwrap_or(config.bind_addr.port());
    config = config.with_bind_addr(SocketAddr::new(cli.host, port));
    if let Some(max) = cli.rate_limit {
        let window = config.rate_limit_window;
        config = config.with_rate_limit(max, window);
    }

    SyncServer::new(config).serve().await?;
    Ok(())
}
