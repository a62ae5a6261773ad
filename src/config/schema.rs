//! Configuration schema definitions.
//!
//! All types derive Serde traits so the whole tree can be deserialized from a
//! TOML file; every section carries defaults matching the docker-compose
//! deployment of the platform.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream service locations.
    pub upstream: UpstreamConfig,

    /// Circuit breaker thresholds and cooldowns.
    pub breaker: BreakerConfig,

    /// Per-instance retry and failover bounds.
    pub retry: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Upstream service locations.
///
/// The game tier is an ordered pool; round-robin order is this configured
/// order. The lobby tier is a single target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URLs of the game-service instances.
    pub game_instances: Vec<String>,

    /// Base URL of the lobby service.
    pub lobby_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            game_instances: vec![
                "http://game_service1:5001/".to_string(),
                "http://game_service2:5001/".to_string(),
                "http://game_service3:5001/".to_string(),
            ],
            lobby_url: "http://lobby_service:5002/".to_string(),
        }
    }
}

/// Circuit breaker configuration.
///
/// Per-instance breakers trip quickly and recover quickly; the global breaker
/// trips on a single fully-failed failover sequence and stays open for
/// minutes so a wholly-down game tier is not hammered.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before a per-instance breaker opens.
    pub instance_fail_max: u32,

    /// Seconds a per-instance breaker stays open before a recovery probe.
    pub instance_open_secs: u64,

    /// Failed failover sequences before the global breaker opens.
    pub global_fail_max: u32,

    /// Seconds the global breaker stays open before a recovery probe.
    pub global_open_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            instance_fail_max: 3,
            instance_open_secs: 60,
            global_fail_max: 1,
            global_open_secs: 300,
        }
    }
}

/// Retry and failover bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum tries against a single instance.
    pub max_retries: u32,

    /// Fixed delay between tries against the same instance, in milliseconds.
    pub backoff_ms: u64,

    /// Maximum number of distinct instances tried per request.
    /// Effectively capped at the pool size.
    pub max_reroutes: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 100,
            max_reroutes: 3,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Hard deadline for one proxied request/response exchange, in seconds.
    pub forward_secs: u64,

    /// Overall inbound request deadline, in seconds. A safety net sized
    /// above the worst-case failover sequence, not a tuning knob.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            forward_secs: 10,
            request_secs: 120,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
