//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     → loader.rs (optional TOML file, then environment overrides)
//!     → validation.rs (semantic checks, all errors reported)
//!     → schema.rs types handed to the server, fixed for process lifetime
//! ```
//!
//! # Design Decisions
//! - Upstream URLs follow the deployment convention: GAME_SERVICE{n}_URL and
//!   LOBBY_SERVICE_URL environment variables override the schema defaults
//! - No hot reload; the target set is immutable after startup
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, ConfigError};
pub use schema::GatewayConfig;
