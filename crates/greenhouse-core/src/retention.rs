//! Retention policies deciding which readings a sensor keeps.
//!
//! A policy is a pure predicate over a reading and a reference time. Sensors
//! apply it with the append time as the reference, so eviction is lazy: a
//! sensor that stops receiving readings keeps its stale history until the next
//! append (or an explicit [`crate::Sensor::evict_expired`]).

use std::time::Duration;

use time::OffsetDateTime;

use crate::types::{Reading, SensorKind};

/// Decides whether a reading is still worth keeping at `now`.
pub trait RetentionPolicy: Send + Sync {
    /// Whether `reading` should be kept at `now`.
    fn retains(&self, reading: &Reading, now: OffsetDateTime) -> bool;

    /// Drop every reading the policy no longer retains.
    ///
    /// Returns how many readings were removed. An empty history is a no-op.
    fn apply(&self, readings: &mut Vec<Reading>, now: OffsetDateTime) -> usize {
        let before = readings.len();
        readings.retain(|r| self.retains(r, now));
        before - readings.len()
    }
}

/// Keep readings strictly newer than `now - window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    window: Duration,
}

impl TimeWindow {
    /// Create a policy with the given window.
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// The window used by `kind`.
    pub fn for_kind(kind: SensorKind) -> Self {
        Self::new(kind.retention_window())
    }

    /// Length of the window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Oldest instant excluded from the window at `now`.
    pub fn horizon(&self, now: OffsetDateTime) -> OffsetDateTime {
        now - self.window
    }
}

impl RetentionPolicy for TimeWindow {
    fn retains(&self, reading: &Reading, now: OffsetDateTime) -> bool {
        reading.timestamp > self.horizon(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const HOUR: Duration = Duration::from_secs(3600);

    fn reading_at(timestamp: OffsetDateTime) -> Reading {
        Reading::new(timestamp, 70.0, "%")
    }

    #[test]
    fn test_horizon_is_exclusive() {
        let policy = TimeWindow::new(24 * HOUR);
        let now = datetime!(2024-05-02 12:00 UTC);

        assert!(!policy.retains(&reading_at(datetime!(2024-05-01 12:00 UTC)), now));
        assert!(policy.retains(&reading_at(datetime!(2024-05-01 12:00:01 UTC)), now));
        assert!(policy.retains(&reading_at(now), now));
    }

    #[test]
    fn test_apply_removes_expired() {
        let policy = TimeWindow::for_kind(SensorKind::Humidity);
        let now = datetime!(2024-05-03 00:00 UTC);
        let mut readings = vec![
            reading_at(datetime!(2024-05-01 00:00 UTC)),
            reading_at(datetime!(2024-05-02 00:00 UTC)),
            reading_at(datetime!(2024-05-02 06:00 UTC)),
            reading_at(datetime!(2024-05-03 00:00 UTC)),
        ];

        let evicted = policy.apply(&mut readings, now);

        assert_eq!(evicted, 2);
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].timestamp, datetime!(2024-05-02 06:00 UTC));
    }

    #[test]
    fn test_apply_on_empty_history() {
        let policy = TimeWindow::for_kind(SensorKind::Temperature);
        let mut readings = Vec::new();
        assert_eq!(policy.apply(&mut readings, datetime!(2024-05-01 00:00 UTC)), 0);
        assert!(readings.is_empty());
    }

    #[test]
    fn test_ph_window_is_three_days() {
        let policy = TimeWindow::for_kind(SensorKind::Ph);
        let now = datetime!(2024-05-04 00:00 UTC);

        assert_eq!(policy.window(), 72 * HOUR);
        assert!(policy.retains(&reading_at(datetime!(2024-05-01 00:00:01 UTC)), now));
        assert!(!policy.retains(&reading_at(datetime!(2024-05-01 00:00 UTC)), now));
    }
}
