//! The virtual sensor.
//!
//! A [`Sensor`] owns an ordered history of [`Reading`]s behind a single
//! mutex. Appends stamp the reading, push it and apply the retention policy
//! while holding that mutex, so readers always observe the history either
//! before or after an append and never in between. Every query returns a copy.
//!
//! # Lock Acquisition
//!
//! The guard is held only for the duration of a push, a retain or a copy. It
//! is never held across an `.await` or a producer sleep, and sensors never
//! share a guard, so operations on different sensors never contend.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use time::OffsetDateTime;
use tracing::trace;

use crate::clock::Clock;
use crate::generator::{ValueGenerator, generator_for};
use crate::retention::{RetentionPolicy, TimeWindow};
use crate::types::{Reading, SensorKind, ValueRange};

/// A simulated sensor with time-window retention.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use greenhouse_core::{ManualClock, Sensor, SensorKind};
/// use time::macros::datetime;
///
/// let clock = Arc::new(ManualClock::new(datetime!(2024-05-01 10:00 UTC)));
/// let sensor = Sensor::for_kind(SensorKind::Humidity, clock);
///
/// sensor.append(71.234);
/// assert_eq!(sensor.last().map(|r| r.value), Some(71.23));
/// assert_eq!(sensor.all().len(), 1);
/// ```
pub struct Sensor {
    name: String,
    unit: String,
    range: ValueRange,
    readings: Mutex<Vec<Reading>>,
    retention: Box<dyn RetentionPolicy>,
    generator: Box<dyn ValueGenerator>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sensor")
            .field("name", &self.name)
            .field("unit", &self.unit)
            .field("range", &self.range)
            .field("readings", &self.len())
            .finish()
    }
}

impl Sensor {
    /// Create a sensor from its parts.
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        range: ValueRange,
        retention: Box<dyn RetentionPolicy>,
        generator: Box<dyn ValueGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            range,
            readings: Mutex::new(Vec::new()),
            retention,
            generator,
            clock,
        }
    }

    /// Create the standard sensor for `kind`.
    pub fn for_kind(kind: SensorKind, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            kind.name(),
            kind.unit(),
            kind.range(),
            Box::new(TimeWindow::for_kind(kind)),
            generator_for(kind),
            clock,
        )
    }

    /// Sensor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit of every reading.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Valid value range.
    pub fn range(&self) -> ValueRange {
        self.range
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Reading>> {
        // push and retain never leave the vector half-written, so a poisoned
        // guard still protects a consistent history.
        self.readings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a value and evict readings that fell out of the window.
    ///
    /// The value is rounded to two decimals and stamped with the clock's time,
    /// read while the guard is held so timestamps stay in append order.
    /// Bounding the value is the generator's job; `append` stores what it is
    /// given. Returns a copy of the stored reading.
    pub fn append(&self, value: f64) -> Reading {
        let (reading, evicted, retained) = {
            let mut readings = self.lock();
            let now = self.clock.now();
            let reading = Reading::new(now, value, &self.unit);
            readings.push(reading.clone());
            let evicted = self.retention.apply(&mut readings, now);
            (reading, evicted, readings.len())
        };

        trace!(
            "{}: appended {} {} ({} retained, {} evicted)",
            self.name, reading.value, reading.unit, retained, evicted
        );
        reading
    }

    /// The most recent retained reading.
    pub fn last(&self) -> Option<Reading> {
        self.lock().last().cloned()
    }

    /// A snapshot of every retained reading, oldest first.
    pub fn all(&self) -> Vec<Reading> {
        self.lock().clone()
    }

    /// A snapshot of the `n` most recent readings, oldest first.
    pub fn latest(&self, n: usize) -> Vec<Reading> {
        let readings = self.lock();
        let start = readings.len().saturating_sub(n);
        readings[start..].to_vec()
    }

    /// The retained count together with the `n` most recent readings, both
    /// taken from one snapshot.
    pub fn latest_with_len(&self, n: usize) -> (usize, Vec<Reading>) {
        let readings = self.lock();
        let start = readings.len().saturating_sub(n);
        (readings.len(), readings[start..].to_vec())
    }

    /// Number of retained readings.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no readings are retained.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Generate the next raw value without storing it.
    pub fn generate_next(&self) -> f64 {
        self.generator.generate(self.clock.now(), &self.range)
    }

    /// Apply the retention policy at the current time without appending.
    ///
    /// Returns how many readings were evicted.
    pub fn evict_expired(&self) -> usize {
        let mut readings = self.lock();
        let now = self.clock.now();
        self.retention.apply(&mut readings, now)
    }

    /// The current time as seen by this sensor.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }
}
