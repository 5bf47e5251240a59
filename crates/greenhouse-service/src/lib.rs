//! Background producers and HTTP REST API for the greenhouse simulator.
//!
//! This crate provides a service that:
//! - Feeds the temperature, humidity and pH sensors on their own schedules
//! - Exposes the readings over HTTP
//! - Saves JSON snapshots of every sensor's history on request
//!
//! # REST API Endpoints
//!
//! - `GET /temperatura` - Latest temperature and the last 10 readings
//! - `GET /humedad` - Latest humidity and the full history
//! - `GET /ph` - Full pH history
//! - `POST /guardar-datos` - Save all histories to `datos_sensores_*.json`
//! - `GET /api/health` - Service health check
//! - `GET /api/status` - Collector and per-sensor status
//! - `GET /api/sensors/{kind}` - One sensor, optionally `?limit=n`
//! - `POST /api/collector/start` / `POST /api/collector/stop`
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/greenhouse/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8000"
//!
//! [export]
//! directory = "/var/lib/greenhouse"
//!
//! [sensors.temperature]
//! interval = 5
//! seed_count = 10
//! ```

pub mod api;
pub mod collector;
pub mod config;
pub mod export;
pub mod state;

pub use collector::Collector;
pub use config::{
    Config, ConfigError, ExportConfig, RetentionConfig, SensorConfig, SensorsConfig, ServerConfig,
    SiteConfig,
};
pub use export::{ExportError, Snapshot};
pub use state::AppState;
