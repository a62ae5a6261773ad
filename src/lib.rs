//! Edge gateway for the Sudoku platform.
//!
//! Routes inbound HTTP under `/game_service/` to a pool of game-service
//! instances with per-instance circuit breaking, bounded retry, and bounded
//! failover; forwards every other path to a single lobby-service target; and
//! tunnels `/ws/lobby/{lobby_id}` WebSocket upgrades to the lobby service.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
