//! Gateway HTTP server.
//!
//! # Responsibilities
//! - Build the Axum router: game-tier failover path, lobby passthrough,
//!   WebSocket tunnel endpoint
//! - Wire up middleware (tracing, overall timeout, request ID)
//! - Relay proxied responses verbatim and map routing errors to 503s
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::config::GatewayConfig;
use crate::http::forwarder::{Forward, ForwardedResponse, HttpForwarder};
use crate::http::request::{RequestIdLayer, X_REQUEST_ID};
use crate::http::websocket;
use crate::load_balancer::TargetPool;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::routing::{FailoverRouter, ProxyContext, RouteError};

/// Request bodies are buffered up to this size before forwarding.
const MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

/// Logical name for the lobby tier in logs and metrics.
const LOBBY: &str = "lobby_service";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub failover: Arc<FailoverRouter<HttpForwarder>>,
    pub forwarder: HttpForwarder,
    pub lobby_url: Arc<Url>,
}

/// HTTP server for the edge gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Build the routing state and handler table from configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, url::ParseError> {
        let forwarder = HttpForwarder::new(Duration::from_secs(config.timeouts.forward_secs));

        let pool = TargetPool::from_urls(
            &config.upstream.game_instances,
            config.breaker.instance_fail_max,
            Duration::from_secs(config.breaker.instance_open_secs),
        )?;

        let failover = Arc::new(FailoverRouter::new(
            pool,
            config.breaker.global_fail_max,
            Duration::from_secs(config.breaker.global_open_secs),
            RetryPolicy {
                max_retries: config.retry.max_retries,
                backoff: Duration::from_millis(config.retry.backoff_ms),
            },
            config.retry.max_reroutes,
            forwarder.clone(),
        ));

        let mut lobby_url = Url::parse(&config.upstream.lobby_url)?;
        if !lobby_url.path().ends_with('/') {
            lobby_url.set_path(&format!("{}/", lobby_url.path()));
        }

        let state = AppState {
            failover,
            forwarder,
            lobby_url: Arc::new(lobby_url),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/ws/lobby/{lobby_id}", get(ws_lobby_handler))
            .route("/game_service/{*path}", any(game_handler))
            .fallback(lobby_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Proxy one request into the game-service failover stack.
async fn game_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = parts.method.to_string();
    let path_and_query = game_path_and_query(&parts.uri);

    let body = match axum::body::to_bytes(body, MAX_REQUEST_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(request_id = %request_id, error = %err, "Failed to buffer request body");
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path_and_query,
        "Proxying game service request"
    );

    let ctx = ProxyContext::new(parts.method, parts.headers, body, path_and_query);

    match state.failover.route(ctx).await {
        Ok(forwarded) => {
            metrics::record_request(&method, forwarded.status.as_u16(), "game", start);
            relay_response(forwarded)
        }
        Err(err) => {
            metrics::record_request(&method, 503, "game", start);
            service_unavailable(route_error_detail(&err))
        }
    }
}

/// Proxy everything that is not game traffic or a WebSocket upgrade to the
/// single lobby target, verbatim and without breaker or retry involvement.
async fn lobby_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    let method = parts.method.to_string();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();
    let url = format!(
        "{}{}",
        state.lobby_url,
        path_and_query.trim_start_matches('/')
    );

    let body = match axum::body::to_bytes(body, MAX_REQUEST_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to buffer request body");
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    let ctx = ProxyContext::new(parts.method, parts.headers, body, path_and_query);

    match state.forwarder.forward(LOBBY, &url, &ctx).await {
        Ok(forwarded) => {
            metrics::record_request(&method, forwarded.status.as_u16(), "lobby", start);
            // Backend statuses, errors included, relay verbatim.
            relay_response(forwarded)
        }
        Err(err) => {
            tracing::error!(target = LOBBY, error = %err, "Lobby request failed");
            metrics::record_request(&method, 503, "lobby", start);
            service_unavailable("Lobby Service is unavailable.")
        }
    }
}

/// Upgrade and hand the connection to the tunnel. Bypasses the breaker
/// stack entirely: one selected target, no failover once open.
async fn ws_lobby_handler(
    State(state): State<AppState>,
    Path(lobby_id): Path<String>,
    RawQuery(query): RawQuery,
    ws: WebSocketUpgrade,
) -> Response {
    let mut path_and_query = format!("/ws/lobby/{lobby_id}");
    if let Some(query) = query {
        path_and_query.push('?');
        path_and_query.push_str(&query);
    }
    let upstream_url = websocket::upstream_ws_url(&state.lobby_url, &path_and_query);

    ws.on_upgrade(move |socket| websocket::tunnel(socket, upstream_url))
}

/// Relative path (plus query) for the game tier: the route prefix is the
/// gateway's own namespace and is stripped before forwarding.
fn game_path_and_query(uri: &Uri) -> String {
    let path = uri.path().strip_prefix("/game_service/").unwrap_or("");
    match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    }
}

/// Rebuild a client response from a buffered upstream exchange.
fn relay_response(forwarded: ForwardedResponse) -> Response {
    let mut response = Response::new(Body::from(forwarded.body));
    *response.status_mut() = forwarded.status;
    let headers = response.headers_mut();
    for (name, value) in forwarded.headers.iter() {
        // The body was buffered, so the upstream framing no longer applies.
        if *name == header::TRANSFER_ENCODING {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    response
}

fn service_unavailable(detail: &str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "detail": detail })),
    )
        .into_response()
}

fn route_error_detail(err: &RouteError) -> &'static str {
    match err {
        RouteError::GlobalBreakerOpen => "Game Service is temporarily unavailable.",
        RouteError::AllInstancesUnavailable => "All Game Service instances are unavailable.",
        // Per-instance errors are absorbed by the failover loop; if one ever
        // escapes, present it like an exhausted pool.
        RouteError::BreakerOpen { .. } | RouteError::InstanceExhausted { .. } => {
            "All Game Service instances are unavailable."
        }
    }
}
