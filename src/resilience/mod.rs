//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to a game instance:
//!     → retries.rs (bounded tries against one instance, fixed backoff)
//!     → circuit_breaker.rs (per-instance breaker wraps every try;
//!       the failover controller's global breaker wraps whole sequences)
//! ```
//!
//! # Design Decisions
//! - Breaker state lives behind a std::sync::Mutex that is never held
//!   across an await; check-and-record cannot be split by a suspension
//! - Breakers trip on transport errors AND non-2xx/3xx statuses; a backend
//!   answering 500s is as unavailable as one refusing connections
//! - Backoff between retries is a fixed configured delay, not exponential

pub mod circuit_breaker;
pub mod retries;

pub use circuit_breaker::{BreakerError, BreakerState, CircuitBreaker};
pub use retries::{attempt_with_retries, RetryPolicy};
