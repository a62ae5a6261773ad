//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use game_gateway::config::GatewayConfig;
use game_gateway::http::GatewayServer;
use game_gateway::lifecycle::Shutdown;

/// Start a mock HTTP backend answering every request with a fixed status and
/// body, counting the requests it sees.
#[allow(dead_code)]
pub async fn start_backend(status: u16, body: &'static str) -> (SocketAddr, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let app = Router::new().fallback(move |_request: Request<Body>| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (StatusCode::from_u16(status).unwrap(), body).into_response()
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, calls)
}

/// Start a mock backend that echoes the request path in its body.
#[allow(dead_code)]
pub async fn start_echo_backend() -> SocketAddr {
    let app = Router::new().fallback(|request: Request<Body>| async move {
        format!("echo:{}", request.uri().path())
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Events observed by the mock WebSocket backend.
#[allow(dead_code)]
#[derive(Debug, PartialEq, Eq)]
pub enum WsEvent {
    /// A connection arrived; carries the requested path and query.
    Connected(String),
    /// The peer side of the tunnel went away.
    Disconnected,
}

/// Start a mock WebSocket backend that echoes text frames.
///
/// When `close_after_first` is set the backend closes the connection right
/// after echoing one message. Connection lifecycle events are reported on
/// the returned channel.
#[allow(dead_code)]
pub async fn start_ws_backend(close_after_first: bool) -> (SocketAddr, mpsc::UnboundedReceiver<WsEvent>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _peer)) = listener.accept().await {
            let events = events_tx.clone();
            tokio::spawn(async move {
                use tokio_tungstenite::tungstenite::handshake::server::{
                    Request as WsRequest, Response as WsResponse,
                };

                let events_for_path = events.clone();
                let callback = move |req: &WsRequest, resp: WsResponse| {
                    let _ = events_for_path.send(WsEvent::Connected(req.uri().to_string()));
                    Ok(resp)
                };
                let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await
                else {
                    return;
                };

                while let Some(Ok(frame)) = ws.next().await {
                    if frame.is_text() || frame.is_binary() {
                        if ws.send(frame).await.is_err() {
                            break;
                        }
                        if close_after_first {
                            let _ = ws.close(None).await;
                            break;
                        }
                    } else if frame.is_close() {
                        break;
                    }
                }
                let _ = events.send(WsEvent::Disconnected);
            });
        }
    });

    (addr, events_rx)
}

/// Start the gateway with the given upstream layout; returns its address.
#[allow(dead_code)]
pub async fn start_gateway(game_instances: Vec<SocketAddr>, lobby: SocketAddr) -> SocketAddr {
    let mut config = GatewayConfig::default();
    config.upstream.game_instances = game_instances
        .iter()
        .map(|addr| format!("http://{addr}/"))
        .collect();
    config.upstream.lobby_url = format!("http://{lobby}/");
    // Fast settings so failure paths finish quickly.
    config.retry.backoff_ms = 10;
    config.timeouts.forward_secs = 2;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config).unwrap();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        // Keep the sender alive for the lifetime of the server task.
        let _shutdown = shutdown;
        server.run(listener, receiver).await.unwrap();
    });

    addr
}

/// An address nothing listens on, for connection-refused scenarios.
#[allow(dead_code)]
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
