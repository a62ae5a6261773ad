//! Routing error taxonomy.
//!
//! Ordered from finest to coarsest grained; each layer of the failover stack
//! converts the previous layer's error into the next:
//! transport/status failure (see `http::forwarder::ForwardError`)
//! → `BreakerOpen` / `InstanceExhausted` (one instance given up on)
//! → `AllInstancesUnavailable` (reroute budget spent)
//! → `GlobalBreakerOpen` (subsequent requests fail fast).

use thiserror::Error;

/// Terminal routing outcomes for one proxied request.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The instance's breaker rejected the call; move to the next target.
    #[error("circuit breaker is open for {target}")]
    BreakerOpen { target: String },

    /// The per-instance retry budget is spent; move to the next target.
    #[error("{target} failed after {attempts} attempts")]
    InstanceExhausted { target: String, attempts: u32 },

    /// The reroute budget is spent; surfaced to the client as 503 and
    /// recorded as one failure on the global breaker.
    #[error("all game service instances are unavailable")]
    AllInstancesUnavailable,

    /// The global breaker is open; no instance was contacted.
    #[error("global circuit breaker is open")]
    GlobalBreakerOpen,
}
