//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound /game_service/* request
//!     → context.rs (buffered method/headers/body + tried-set)
//!     → failover.rs (global breaker gate, round-robin candidates,
//!       per-instance retry executor, explicit global failure record)
//!     → error.rs (tagged routing errors, coarser at every layer:
//!       retry → skip instance → skip pool → fail fast)
//! ```
//!
//! # Design Decisions
//! - Errors are values threaded through Results, never unwinding; each
//!   layer absorbs the finer-grained error and emits the next coarser one
//! - The global breaker only ever counts fully exhausted sequences

pub mod context;
pub mod error;
pub mod failover;

pub use context::ProxyContext;
pub use error::RouteError;
pub use failover::FailoverRouter;
