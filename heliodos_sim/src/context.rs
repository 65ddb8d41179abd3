//! Virtual clock for deterministic runs.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use heliodos_env::{ReferenceClock, Timestamp};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Simulation clock backed by virtual time.
///
/// Time only moves when the harness calls [`advance_time`](Self::advance_time).
/// Clones share the same timeline.
pub struct SimClock {
    /// Virtual time 0 maps to this instant
    epoch: Timestamp,

    /// Elapsed virtual time in microseconds
    elapsed_us: Arc<Mutex<i64>>,
}

impl SimClock {
    /// Creates a clock starting at `epoch`.
    pub fn new(epoch: Timestamp) -> Self {
        Self {
            epoch,
            elapsed_us: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an Arc-wrapped clock for sharing.
    pub fn shared(epoch: Timestamp) -> Arc<Self> {
        Arc::new(Self::new(epoch))
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        *self.elapsed_us.lock() += duration.as_micros() as i64;
    }

    /// Jumps to `time`; earlier instants rewind the clock.
    pub fn set_time(&self, time: Timestamp) {
        let offset = (time - self.epoch).num_microseconds().unwrap_or(i64::MAX);
        *self.elapsed_us.lock() = offset;
    }

    /// Elapsed virtual time since the epoch.
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros((*self.elapsed_us.lock()).max(0) as u64)
    }

    pub fn elapsed_secs(&self) -> f64 {
        *self.elapsed_us.lock() as f64 / 1e6
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }
}

impl Clone for SimClock {
    fn clone(&self) -> Self {
        Self {
            epoch: self.epoch,
            elapsed_us: Arc::clone(&self.elapsed_us),
        }
    }
}

impl ReferenceClock for SimClock {
    fn now(&self) -> Timestamp {
        self.epoch + ChronoDuration::microseconds(*self.elapsed_us.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn epoch() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 21, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_sim_clock_time() {
        let clock = SimClock::new(epoch());
        assert_eq!(clock.now(), epoch());

        clock.advance_time(Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::from_secs(1));

        clock.advance_time(Duration::from_millis(500));
        assert_eq!(clock.now(), epoch() + ChronoDuration::milliseconds(1500));
        assert_eq!(clock.elapsed_secs(), 1.5);
    }

    #[test]
    fn test_sim_clock_clone_shares_time() {
        let clock1 = SimClock::new(epoch());
        let clock2 = clock1.clone();

        clock1.advance_time(Duration::from_secs(5));

        assert_eq!(clock1.now(), clock2.now());
    }

    #[test]
    fn test_set_time() {
        let clock = SimClock::new(epoch());
        let later = epoch() + ChronoDuration::hours(3);
        clock.set_time(later);
        assert_eq!(clock.now(), later);
        assert_eq!(clock.elapsed(), Duration::from_secs(3 * 3600));
    }
}
