//! Round-robin cursor.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared round-robin cursor.
///
/// Advances on every selection attempt, not only on successful forwards, so
/// after N selections against a pool of size K every position has been
/// offered at least ⌊N/K⌋ times. Health is deliberately not consulted here;
/// the failover controller skips open-breaker targets itself.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current position and advance the cursor.
    ///
    /// A single fetch_add keeps concurrent callers from ever observing the
    /// same position before either has advanced it.
    pub fn next_index(&self, len: usize) -> usize {
        debug_assert!(len > 0);
        self.cursor.fetch_add(1, Ordering::Relaxed) % len
    }
}
