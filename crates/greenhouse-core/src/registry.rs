//! The set of sensors installed in the greenhouse.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;

use crate::clock::Clock;
use crate::sensor::Sensor;
use crate::types::SensorKind;

/// Exactly one sensor of each [`SensorKind`], sharing one clock.
///
/// Sensors are handed out as `Arc`s so producer tasks and request handlers
/// can hold them without borrowing the registry.
#[derive(Clone)]
pub struct SensorRegistry {
    temperature: Arc<Sensor>,
    humidity: Arc<Sensor>,
    ph: Arc<Sensor>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorRegistry")
            .field("temperature", &self.temperature)
            .field("humidity", &self.humidity)
            .field("ph", &self.ph)
            .finish_non_exhaustive()
    }
}

impl SensorRegistry {
    /// Build the standard sensors with empty histories.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            temperature: Arc::new(Sensor::for_kind(SensorKind::Temperature, Arc::clone(&clock))),
            humidity: Arc::new(Sensor::for_kind(SensorKind::Humidity, Arc::clone(&clock))),
            ph: Arc::new(Sensor::for_kind(SensorKind::Ph, Arc::clone(&clock))),
            clock,
        }
    }

    /// Build a registry from custom sensors.
    ///
    /// `clock` serves registry-wide timestamps such as [`SensorRegistry::now`].
    pub fn from_sensors(
        temperature: Sensor,
        humidity: Sensor,
        ph: Sensor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            temperature: Arc::new(temperature),
            humidity: Arc::new(humidity),
            ph: Arc::new(ph),
            clock,
        }
    }

    /// The current time on the registry's clock.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// The sensor of the given kind.
    pub fn get(&self, kind: SensorKind) -> &Arc<Sensor> {
        match kind {
            SensorKind::Temperature => &self.temperature,
            SensorKind::Humidity => &self.humidity,
            SensorKind::Ph => &self.ph,
        }
    }

    /// Every sensor with its kind, in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (SensorKind, &Arc<Sensor>)> {
        SensorKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// Generate and append `count` readings on the sensor of `kind`.
    ///
    /// Used at start-up, before producers run, so the first queries already
    /// return data.
    pub fn seed(&self, kind: SensorKind, count: usize) {
        let sensor = self.get(kind);
        for _ in 0..count {
            let value = sensor.generate_next();
            sensor.append(value);
        }
        info!("Seeded {} with {} reading(s)", sensor.name(), count);
    }

    /// Seed every sensor with its default count.
    pub fn seed_defaults(&self) {
        for kind in SensorKind::ALL {
            self.seed(kind, kind.default_seed_count());
        }
    }
}
