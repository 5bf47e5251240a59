//! Virtual greenhouse sensors.
//!
//! This crate models a small set of simulated environmental sensors
//! (temperature, humidity and pH). Each [`Sensor`] keeps a bounded time window
//! of [`Reading`]s, receives new values from its own periodic producer and
//! serves consistent snapshots to concurrent readers.
//!
//! # Features
//!
//! - One sensor type, specialised per kind with an injected
//!   [`RetentionPolicy`] and [`ValueGenerator`]
//! - Time-window eviction applied on every append
//! - Copy-on-read snapshots guarded by a per-sensor mutex
//! - Injectable [`Clock`] for deterministic tests
//! - Cancellable periodic producers running on tokio
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use greenhouse_core::{SensorKind, SensorRegistry, SystemClock};
//!
//! let registry = SensorRegistry::new(Arc::new(SystemClock::utc()));
//! registry.seed_defaults();
//!
//! let temperature = registry.get(SensorKind::Temperature);
//! assert_eq!(temperature.all().len(), 10);
//! assert!(temperature.last().is_some());
//! ```

pub mod clock;
pub mod error;
pub mod generator;
pub mod producer;
pub mod registry;
pub mod retention;
pub mod sensor;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use generator::{DiurnalTemperature, Uniform, ValueGenerator, generator_for};
pub use producer::{spawn_producer, spawn_sweeper};
pub use registry::SensorRegistry;
pub use retention::{RetentionPolicy, TimeWindow};
pub use sensor::Sensor;
pub use types::{Reading, SensorKind, ValueRange, round_to_hundredths};
