//! Sudoku platform edge gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                   EDGE GATEWAY                   │
//!                        │                                                  │
//!   /game_service/*  ────┼─▶ global breaker ─▶ failover ─▶ retry ─▶ per-    │
//!                        │                     controller   executor target │──▶ game pool
//!                        │                        │                breaker  │
//!                        │                        ▼                         │
//!                        │                  round-robin selector            │
//!                        │                                                  │
//!   /ws/lobby/{id}   ────┼─▶ websocket tunnel (bidirectional relay) ────────│──▶ lobby svc
//!                        │                                                  │
//!   everything else  ────┼─▶ plain passthrough forwarder ────────────────── │──▶ lobby svc
//!                        └──────────────────────────────────────────────────┘
//! ```
//!
//! All routing state (cursor, breakers) is in-memory and rebuilt on startup;
//! replica processes each carry an independent copy.

use tokio::net::TcpListener;

use game_gateway::config;
use game_gateway::http::GatewayServer;
use game_gateway::lifecycle::{signals, Shutdown};
use game_gateway::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load()?;

    logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        game_instances = config.upstream.game_instances.len(),
        lobby_url = %config.upstream.lobby_url,
        max_reroutes = config.retry.max_reroutes,
        "game-gateway starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        trigger.trigger();
    });

    let server = GatewayServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
