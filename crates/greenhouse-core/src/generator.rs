//! Value generation strategies.
//!
//! Each sensor kind owns a [`ValueGenerator`] that turns "now" and the
//! sensor's valid range into the next raw value. Generators are stateless; the
//! only input besides randomness is the supplied time.

use rand::Rng;
use time::OffsetDateTime;

use crate::types::{SensorKind, ValueRange};

/// Produces the next raw value for a sensor.
///
/// Implementations must return a value inside `range`.
pub trait ValueGenerator: Send + Sync {
    /// Generate a value for the instant `now`.
    fn generate(&self, now: OffsetDateTime, range: &ValueRange) -> f64;
}

/// Build the generator used by `kind`.
pub fn generator_for(kind: SensorKind) -> Box<dyn ValueGenerator> {
    match kind {
        SensorKind::Temperature => Box::new(DiurnalTemperature::default()),
        SensorKind::Humidity | SensorKind::Ph => Box::new(Uniform),
    }
}

const MAX_JITTER: f64 = f64::MAX / 4.0;

/// Temperature following a coarse day/night profile.
///
/// The hour of `now` (at whatever offset the clock reports) selects a base
/// value, a uniform perturbation of up to `jitter` is added, and the result is
/// clamped into the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiurnalTemperature {
    jitter: f64,
}

impl DiurnalTemperature {
    /// Create a generator with a custom perturbation amplitude.
    ///
    /// The sign is ignored. A non-finite amplitude disables the perturbation
    /// and huge amplitudes are capped so the sampled span stays finite.
    pub fn with_jitter(jitter: f64) -> Self {
        let jitter = if jitter.is_finite() {
            jitter.abs().min(MAX_JITTER)
        } else {
            0.0
        };
        Self { jitter }
    }

    /// Base temperature for an hour of the day.
    pub fn base_for_hour(hour: u8) -> f64 {
        match hour {
            6..=11 => 20.0,
            12..=17 => 28.0,
            18..=21 => 24.0,
            _ => 18.0,
        }
    }
}

impl Default for DiurnalTemperature {
    fn default() -> Self {
        Self { jitter: 2.0 }
    }
}

impl ValueGenerator for DiurnalTemperature {
    fn generate(&self, now: OffsetDateTime, range: &ValueRange) -> f64 {
        let base = Self::base_for_hour(now.hour());
        let variation = if self.jitter > 0.0 {
            rand::rng().random_range(-self.jitter..=self.jitter)
        } else {
            0.0
        };
        range.clamp(base + variation)
    }
}

/// A value drawn uniformly from the whole range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uniform;

impl ValueGenerator for Uniform {
    fn generate(&self, _now: OffsetDateTime, range: &ValueRange) -> f64 {
        rand::rng().random_range(range.min()..=range.max())
    }
}
