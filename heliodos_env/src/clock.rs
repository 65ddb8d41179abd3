//! Reference clock abstraction.

use crate::types::Timestamp;
use chrono::Utc;

/// Source of "now" for the overlay.
///
/// Hosts normally draw the overlay for the current instant, but the settings
/// allow pinning a manual time, and simulations run on a virtual clock. All
/// three go through this trait.
///
/// # Implementations
///
/// - **Production**: [`SystemClock`] - wall clock
/// - **Simulation**: `heliodos_sim::SimClock` - virtual time advanced by the harness
pub trait ReferenceClock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ReferenceClock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl ReferenceClock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
