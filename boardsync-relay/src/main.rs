//! boardsync relay
//!
//! Runs the in-memory game relay over TCP. Clients open a connection with
//! `{"game": "<id>"}` and then speak the line-JSON sync protocol.
//!
//! Usage:
//!   boardsync-relay --port 4001
//!
//! Rooms live in memory only; restarting the relay drops every game.

use anyhow::{Context, Result};
use boardsync_relay::{Hub, RelayConfig, serve};
use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "boardsync-relay")]
#[command(about = "In-memory relay for boardsync games")]
struct Args {
    /// Port to listen on (TCP)
    #[arg(short, long, default_value = "4001")]
    port: u16,

    /// Records per join chunk
    #[arg(long, default_value = "50")]
    chunk_size: usize,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let config = RelayConfig {
        join_chunk_size: args.chunk_size,
        bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port)),
    };
    info!(
        "boardsync relay starting (chunk size {})",
        config.join_chunk_size
    );

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let hub = Arc::new(Mutex::new(Hub::new(config)));
    serve(listener, hub).await?;
    Ok(())
}
