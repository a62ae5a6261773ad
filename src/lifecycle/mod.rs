//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! OS signal → signals.rs → Shutdown::trigger()
//!     → broadcast to the HTTP server's graceful-shutdown future
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
