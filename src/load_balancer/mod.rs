//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Failover controller asks for a candidate:
//!     → round_robin.rs (advance the shared cursor, every call)
//!     → pool.rs (hand back the target at that position)
//!     → target.rs (base URL + that target's circuit breaker)
//! ```
//!
//! # Design Decisions
//! - The selector is health-blind: it advances on every selection attempt
//!   and never filters; breaker-based skipping happens in the caller
//! - The pool is fixed at startup; round-robin order is configured order
//! - Cursor advancement is a single atomic fetch_add, safe under
//!   concurrent requests

pub mod pool;
pub mod round_robin;
pub mod target;

pub use pool::TargetPool;
pub use round_robin::RoundRobin;
pub use target::Target;
