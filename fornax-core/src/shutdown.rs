//! Cooperative shutdown latch
//!
//! A process-wide one-way flag: set exactly once when any unit decides
//! the system must come down, observed by every long-running loop at
//! least once per iteration. There is no reset; a latched shutdown
//! only ends in teardown.

use core::sync::atomic::{AtomicBool, Ordering};

/// One-way cancellation latch shared by all tasks
#[derive(Debug, Default)]
pub struct ShutdownLatch(AtomicBool);

impl ShutdownLatch {
    /// Create an unlatched instance (const, usable in statics)
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Latch the shutdown. Idempotent.
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether shutdown has been latched
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_is_one_way() {
        let latch = ShutdownLatch::new();
        assert!(!latch.is_set());

        latch.set();
        assert!(latch.is_set());

        // Setting again changes nothing
        latch.set();
        assert!(latch.is_set());
    }
}
