use chrono::Duration;
use hermes_core::Timestamp;
use hermes_ports::Clock;
use std::sync::{Arc, RwLock};

/// Manually advanced clock for deterministic tests
///
/// Time only moves when the test says so, which makes timeout and
/// day-boundary behavior exactly reproducible. Clones share the same
/// underlying instant.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<RwLock<Timestamp>>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().expect("clock lock poisoned");
        *now = *now + by;
    }

    /// Jump to an absolute instant (must not move backwards)
    pub fn set(&self, to: Timestamp) {
        let mut now = self.now.write().expect("clock lock poisoned");
        debug_assert!(to >= *now, "manual clock moved backwards");
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read().expect("clock lock poisoned")
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_manual_clock_is_frozen_until_advanced() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start);

        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start + Duration::seconds(90));
    }

    #[test]
    fn test_clones_share_time() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start);
        let view = clock.clone();

        clock.advance(Duration::minutes(5));
        assert_eq!(view.now(), start + Duration::minutes(5));
    }
}
