//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router: /game_service/* → failover stack,
//!       /ws/lobby/{id} → tunnel, everything else → lobby passthrough)
//!     → request.rs (request ID layer)
//!     → forwarder.rs (one buffered exchange against a chosen target)
//!     → websocket.rs (bidirectional frame relay to the lobby service)
//! ```

pub mod forwarder;
pub mod request;
pub mod server;
pub mod websocket;

pub use forwarder::{Forward, ForwardError, ForwardedResponse, HttpForwarder};
pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::GatewayServer;
