//! Single proxied request/response exchange.
//!
//! # Responsibilities
//! - Reproduce method, headers, and body unchanged against a target URL
//! - Enforce the hard per-call timeout
//! - Buffer the response so the caller can relay it verbatim
//!
//! # Design Decisions
//! - Bodies are fully buffered; streaming is not needed for game/lobby
//!   payloads and buffering keeps retries trivial
//! - Status classification is the caller's choice: `forward` returns any
//!   received response, `ensure_success` converts non-2xx/3xx into an error
//!   so breaker-guarded paths count backend errors as failures while the
//!   lobby passthrough relays them untouched

use std::future::Future;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::routing::context::ProxyContext;

/// Response bodies are buffered up to this size.
const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// Failure of one forwarded exchange.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Connection-level failure (refused, reset, DNS, malformed exchange).
    #[error("transport error contacting {target}: {reason}")]
    Transport { target: String, reason: String },

    /// The hard per-call deadline expired.
    #[error("request to {target} timed out")]
    Timeout { target: String },

    /// The backend answered, but with a non-2xx/3xx status.
    #[error("{target} answered {status}")]
    BackendStatus { target: String, status: StatusCode },
}

/// One buffered upstream response.
#[derive(Debug)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ForwardedResponse {
    /// Treat non-2xx/3xx statuses as forwarding failures.
    ///
    /// For breaker purposes a backend 5xx (or 4xx) is indistinguishable from
    /// a transport failure.
    pub fn ensure_success(self, target: &str) -> Result<Self, ForwardError> {
        if self.status.as_u16() < 400 {
            Ok(self)
        } else {
            Err(ForwardError::BackendStatus {
                target: target.to_string(),
                status: self.status,
            })
        }
    }
}

/// Seam between routing policy and the wire.
///
/// The retry executor and failover controller are generic over this so their
/// policy is testable without sockets; `HttpForwarder` is the production
/// implementation.
pub trait Forward: Send + Sync {
    /// Issue one outbound request for `ctx` against `url`.
    ///
    /// `target` is the logical target name, used in errors and logs.
    fn forward(
        &self,
        target: &str,
        url: &str,
        ctx: &ProxyContext,
    ) -> impl Future<Output = Result<ForwardedResponse, ForwardError>> + Send;
}

/// hyper-based forwarder shared by the failover stack and the lobby
/// passthrough.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HttpForwarder {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, timeout }
    }
}

impl Forward for HttpForwarder {
    async fn forward(
        &self,
        target: &str,
        url: &str,
        ctx: &ProxyContext,
    ) -> Result<ForwardedResponse, ForwardError> {
        let mut builder = Request::builder().method(ctx.method().clone()).uri(url);
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in ctx.headers() {
                headers.append(name.clone(), value.clone());
            }
        }
        let request = builder
            .body(Body::from(ctx.body().clone()))
            .map_err(|e| transport(target, e))?;

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| ForwardError::Timeout {
                target: target.to_string(),
            })?
            .map_err(|e| transport(target, e))?;

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| transport(target, e))?;

        Ok(ForwardedResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

fn transport(target: &str, err: impl std::fmt::Display) -> ForwardError {
    ForwardError::Transport {
        target: target.to_string(),
        reason: err.to_string(),
    }
}
