//! game-bridge
//!
//! Translates browser transports into the backend game server's framed
//! TCP protocol.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────┐
//!                       │                  GAME BRIDGE                   │
//!   POST /api/send      │  ┌──────────┐   ┌───────────┐                  │
//!   ────────────────────┼─▶│ http api │──▶│ forwarder │──── one frame ───┼──▶ Backend
//!   ◀───────────────────┼──│          │◀──│ (one-shot)│◀─── one frame ───┼──  (TCP,
//!                       │  └──────────┘   └───────────┘                  │   u32 BE
//!                       │                                                │   length +
//!   WebSocket           │  ┌──────────┐   ┌───────────┐                  │   JSON)
//!   ◀═══════════════════┼═▶│websocket │══▶│  session  │◀═══ frames ══════┼═▶
//!                       │  └──────────┘   │   relay   │                  │
//!                       │                 └─────┬─────┘                  │
//!                       │                       ▼                        │
//!                       │                 ┌───────────┐  ┌────────────┐  │
//!                       │                 │ registry  │──│ admin api  │  │
//!                       │                 └───────────┘  └────────────┘  │
//!                       │  config (TOML + env + watch) · observability · │
//!                       │  lifecycle (signals, shutdown, drain)          │
//!                       └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use game_bridge::config::{load_startup_config, watcher::ConfigWatcher};
use game_bridge::lifecycle::{signals::wait_for_shutdown_signal, Shutdown};
use game_bridge::observability::{logging::init_logging, metrics::init_metrics};
use game_bridge::BridgeServer;

#[derive(Parser)]
#[command(name = "game-bridge")]
#[command(about = "WebSocket/HTTP bridge for the game backend", long_about = None)]
struct Args {
    /// TOML configuration file. Watched for changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_startup_config(args.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!("game-bridge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        http_address = %config.listener.http_address,
        ws_address = %config.listener.ws_address,
        backend_host = %config.backend.host,
        backend_port = config.backend.port,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let http_listener = TcpListener::bind(&config.listener.http_address).await?;
    let ws_listener = TcpListener::bind(&config.listener.ws_address).await?;

    // The watcher handle must outlive the server.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        None => (tokio::sync::mpsc::unbounded_channel().1, None),
    };

    let shutdown = Shutdown::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        signal.trigger();
    });

    let server = BridgeServer::new(config);
    server
        .run(http_listener, ws_listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
