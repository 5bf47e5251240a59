//! Time sources for sensors.
//!
//! Sensors never read the system time directly. They ask a [`Clock`], which
//! lets tests pin "now" and step it forward deterministically.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use time::{OffsetDateTime, UtcOffset};

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time, reported at a fixed UTC offset.
///
/// The offset only affects how the hour of day is seen by generators; the
/// instant itself is always the real current time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    /// A clock reporting UTC.
    pub fn utc() -> Self {
        Self {
            offset: UtcOffset::UTC,
        }
    }

    /// A clock reporting the given offset.
    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// A clock that only moves when told to.
///
/// # Example
///
/// ```
/// use greenhouse_core::{Clock, ManualClock};
/// use std::time::Duration;
/// use time::macros::datetime;
///
/// let clock = ManualClock::new(datetime!(2024-05-01 10:00 UTC));
/// clock.advance(Duration::from_secs(3600));
/// assert_eq!(clock.now(), datetime!(2024-05-01 11:00 UTC));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    /// Create a clock stopped at `start`.
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock to `at`.
    pub fn set(&self, at: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
