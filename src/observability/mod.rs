//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; every terminal routing failure logs
//!   the target and reason
//! - Prometheus metrics exposed on a dedicated listener, off by default

pub mod logging;
pub mod metrics;
