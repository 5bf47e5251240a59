//! Core types for greenhouse sensor data.

use core::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{Error, Result};

/// Round a value to two decimal places.
#[must_use]
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A single timestamped measurement.
///
/// Readings are created only by [`crate::Sensor::append`] and are never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// When the reading was appended.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Measured value, rounded to two decimal places.
    pub value: f64,
    /// Unit of the value (e.g. `°C`).
    pub unit: String,
}

impl Reading {
    /// Create a reading, rounding `value` to two decimal places.
    pub(crate) fn new(timestamp: OffsetDateTime, value: f64, unit: &str) -> Self {
        Self {
            timestamp,
            value: round_to_hundredths(value),
            unit: unit.to_string(),
        }
    }
}

/// Inclusive range of valid values for a sensor.
///
/// Deserialization goes through [`ValueRange::new`], so inverted or
/// non-finite bounds are rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawValueRange")]
pub struct ValueRange {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct RawValueRange {
    min: f64,
    max: f64,
}

impl TryFrom<RawValueRange> for ValueRange {
    type Error = Error;

    fn try_from(raw: RawValueRange) -> Result<Self> {
        Self::new(raw.min, raw.max)
    }
}

impl ValueRange {
    /// Create a range, rejecting inverted or non-finite bounds.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::NonFiniteRange { min, max });
        }
        if min > max {
            return Err(Error::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clamp `value` into the range.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Whether `value` lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// The three kinds of sensor installed in the greenhouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Air temperature in degrees Celsius.
    Temperature,
    /// Relative humidity in percent.
    Humidity,
    /// Soil pH.
    Ph,
}

impl SensorKind {
    /// All kinds, in registry order.
    pub const ALL: [SensorKind; 3] = [SensorKind::Temperature, SensorKind::Humidity, SensorKind::Ph];

    /// Display name of the sensor.
    pub fn name(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "Temperatura",
            SensorKind::Humidity => "Humedad",
            SensorKind::Ph => "pH",
        }
    }

    /// Unit attached to every reading.
    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "°C",
            SensorKind::Humidity => "%",
            SensorKind::Ph => "pH",
        }
    }

    /// Valid value range.
    pub fn range(&self) -> ValueRange {
        let (min, max) = match self {
            SensorKind::Temperature => (15.0, 35.0),
            SensorKind::Humidity => (60.0, 90.0),
            SensorKind::Ph => (5.5, 7.5),
        };
        ValueRange { min, max }
    }

    /// How long readings are kept.
    pub fn retention_window(&self) -> Duration {
        match self {
            SensorKind::Temperature | SensorKind::Humidity => Duration::from_secs(24 * 3600),
            SensorKind::Ph => Duration::from_secs(72 * 3600),
        }
    }

    /// Default interval between produced readings.
    pub fn default_interval(&self) -> Duration {
        match self {
            SensorKind::Temperature => Duration::from_secs(5),
            SensorKind::Humidity => Duration::from_secs(2 * 3600),
            SensorKind::Ph => Duration::from_secs(6 * 3600),
        }
    }

    /// Default number of readings generated at start-up.
    pub fn default_seed_count(&self) -> usize {
        match self {
            SensorKind::Temperature => 10,
            SensorKind::Humidity | SensorKind::Ph => 5,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Temperature => write!(f, "temperature"),
            SensorKind::Humidity => write!(f, "humidity"),
            SensorKind::Ph => write!(f, "ph"),
        }
    }
}

impl FromStr for SensorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "temperature" | "temperatura" => Ok(SensorKind::Temperature),
            "humidity" | "humedad" => Ok(SensorKind::Humidity),
            "ph" => Ok(SensorKind::Ph),
            _ => Err(Error::UnknownSensorKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_round_to_hundredths() {
        assert_eq!(round_to_hundredths(21.456), 21.46);
        assert_eq!(round_to_hundredths(21.454), 21.45);
        assert_eq!(round_to_hundredths(-3.0), -3.0);
    }

    #[test]
    fn test_reading_new_rounds_value() {
        let reading = Reading::new(datetime!(2024-05-01 10:00 UTC), 6.789, "pH");
        assert_eq!(reading.value, 6.79);
        assert_eq!(reading.unit, "pH");
    }

    #[test]
    fn test_reading_serialization() {
        let reading = Reading::new(datetime!(2024-05-01 10:30:00 UTC), 22.5, "°C");
        let json = serde_json::to_value(&reading).unwrap();

        assert_eq!(json["timestamp"], "2024-05-01T10:30:00Z");
        assert_eq!(json["value"], 22.5);
        assert_eq!(json["unit"], "°C");
    }

    #[test]
    fn test_value_range_validation() {
        assert!(ValueRange::new(1.0, 2.0).is_ok());
        assert!(ValueRange::new(2.0, 2.0).is_ok());
        assert_eq!(
            ValueRange::new(3.0, 2.0),
            Err(Error::InvalidRange { min: 3.0, max: 2.0 })
        );
        assert!(matches!(
            ValueRange::new(f64::NAN, 2.0),
            Err(Error::NonFiniteRange { .. })
        ));
    }

    #[test]
    fn test_value_range_deserialize_validates() {
        let range: ValueRange = serde_json::from_str(r#"{"min": 5.5, "max": 7.5}"#).unwrap();
        assert_eq!(range, SensorKind::Ph.range());

        let inverted = serde_json::from_str::<ValueRange>(r#"{"min": 7.5, "max": 5.5}"#);
        let err = inverted.unwrap_err().to_string();
        assert!(err.contains("must not exceed"), "got {err}");
    }

    #[test]
    fn test_value_range_clamp() {
        let range = ValueRange::new(15.0, 35.0).unwrap();
        assert_eq!(range.clamp(10.0), 15.0);
        assert_eq!(range.clamp(40.0), 35.0);
        assert_eq!(range.clamp(20.0), 20.0);
        assert!(range.contains(15.0));
        assert!(range.contains(35.0));
        assert!(!range.contains(35.01));
    }

    #[test]
    fn test_sensor_kind_properties() {
        assert_eq!(SensorKind::Temperature.unit(), "°C");
        assert_eq!(SensorKind::Humidity.range().min(), 60.0);
        assert_eq!(SensorKind::Ph.range().max(), 7.5);
        assert_eq!(
            SensorKind::Ph.retention_window(),
            Duration::from_secs(72 * 3600)
        );
        assert_eq!(SensorKind::Humidity.default_interval(), Duration::from_secs(7200));
        assert_eq!(SensorKind::Temperature.default_seed_count(), 10);
    }

    #[test]
    fn test_sensor_kind_from_str() {
        assert_eq!("temperatura".parse::<SensorKind>(), Ok(SensorKind::Temperature));
        assert_eq!("Humidity".parse::<SensorKind>(), Ok(SensorKind::Humidity));
        assert_eq!(" PH ".parse::<SensorKind>(), Ok(SensorKind::Ph));
        assert!(matches!(
            "co2".parse::<SensorKind>(),
            Err(Error::UnknownSensorKind(_))
        ));
    }

    #[test]
    fn test_sensor_kind_display_round_trips() {
        for kind in SensorKind::ALL {
            assert_eq!(kind.to_string().parse::<SensorKind>(), Ok(kind));
        }
    }
}
