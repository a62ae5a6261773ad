//! WebSocket tunnel to the lobby service.
//!
//! # Responsibilities
//! - Open an outbound WebSocket connection to the lobby target
//! - Relay frames in both directions, close frames included
//! - Tear both relay tasks down as soon as either direction finishes
//!
//! # Data Flow
//! ```text
//! Client ←──── frames ────→ Gateway ←──── frames ────→ Lobby service
//! ```
//!
//! # Design Decisions
//! - No retry or failover once a tunnel is open; a broken tunnel surfaces
//!   to the client as a closed connection
//! - Frame-level forwarding, no message buffering or interpretation
//! - First-to-finish teardown: the surviving relay task is aborted, which
//!   drops its socket half and closes the underlying connection

use axum::extract::ws::{self, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, protocol::CloseFrame};

/// Derive the upstream WebSocket URL from an http(s) lobby base URL.
///
/// Scheme is substituted (`http` → `ws`, `https` → `wss`); the original
/// path and query, token parameter included, are appended unchanged.
pub fn upstream_ws_url(lobby_base: &url::Url, path_and_query: &str) -> String {
    let scheme = if lobby_base.scheme() == "https" { "wss" } else { "ws" };
    let base = lobby_base.as_str();
    let without_scheme = base.split_once("://").map(|(_, rest)| rest).unwrap_or(base);
    format!(
        "{scheme}://{}{}",
        without_scheme.trim_end_matches('/'),
        path_and_query
    )
}

/// Run one tunnel session on an accepted client socket.
///
/// Owns both relay tasks and the upstream connection; returns when either
/// direction terminates, after cancelling the other.
pub async fn tunnel(client: WebSocket, upstream_url: String) {
    let upstream = match connect_async(&upstream_url).await {
        Ok((stream, _response)) => stream,
        Err(err) => {
            tracing::error!(url = %upstream_url, error = %err, "Failed to connect to lobby websocket");
            // Surface as a closed connection, the tunnel's only failure mode.
            let mut client = client;
            let _ = client.close().await;
            return;
        }
    };
    tracing::info!(url = %upstream_url, "Connected to lobby websocket");

    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let mut client_to_upstream = tokio::spawn(async move {
        while let Some(Ok(frame)) = client_rx.next().await {
            let Some(frame) = to_upstream_frame(frame) else {
                continue;
            };
            if upstream_tx.send(frame).await.is_err() {
                break;
            }
        }
        let _ = upstream_tx.close().await;
    });

    let mut upstream_to_client = tokio::spawn(async move {
        while let Some(Ok(frame)) = upstream_rx.next().await {
            let Some(frame) = to_client_frame(frame) else {
                continue;
            };
            if client_tx.send(frame).await.is_err() {
                break;
            }
        }
        let _ = client_tx.close().await;
    });

    // First direction to finish cancels the other; aborting drops the
    // surviving task's socket half, closing the connection.
    tokio::select! {
        _ = &mut client_to_upstream => upstream_to_client.abort(),
        _ = &mut upstream_to_client => client_to_upstream.abort(),
    }
    tracing::debug!(url = %upstream_url, "Tunnel closed");
}

fn to_upstream_frame(frame: ws::Message) -> Option<tungstenite::Message> {
    Some(match frame {
        ws::Message::Text(text) => tungstenite::Message::Text(text.as_str().into()),
        ws::Message::Binary(data) => tungstenite::Message::Binary(data),
        ws::Message::Ping(data) => tungstenite::Message::Ping(data),
        ws::Message::Pong(data) => tungstenite::Message::Pong(data),
        ws::Message::Close(frame) => tungstenite::Message::Close(frame.map(|f| CloseFrame {
            code: f.code.into(),
            reason: f.reason.as_str().into(),
        })),
    })
}

fn to_client_frame(frame: tungstenite::Message) -> Option<ws::Message> {
    Some(match frame {
        tungstenite::Message::Text(text) => ws::Message::Text(text.as_str().into()),
        tungstenite::Message::Binary(data) => ws::Message::Binary(data),
        tungstenite::Message::Ping(data) => ws::Message::Ping(data),
        tungstenite::Message::Pong(data) => ws::Message::Pong(data),
        tungstenite::Message::Close(frame) => {
            ws::Message::Close(frame.map(|f| ws::CloseFrame {
                code: f.code.into(),
                reason: f.reason.as_str().into(),
            }))
        }
        // Raw frames never surface from a configured client stream.
        tungstenite::Message::Frame(_) => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_ws_url_from_http_base() {
        let base = url::Url::parse("http://lobby_service:5002/").unwrap();
        assert_eq!(
            upstream_ws_url(&base, "/ws/lobby/42?token=abc"),
            "ws://lobby_service:5002/ws/lobby/42?token=abc"
        );
    }

    #[test]
    fn derives_wss_url_from_https_base() {
        let base = url::Url::parse("https://lobby.example.com/").unwrap();
        assert_eq!(
            upstream_ws_url(&base, "/ws/lobby/7?token=t"),
            "wss://lobby.example.com/ws/lobby/7?token=t"
        );
    }
}
