//! Service configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use greenhouse_core::SensorKind;
use serde::{Deserialize, Serialize};
use time::UtcOffset;

/// Service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Snapshot export settings.
    pub export: ExportConfig,
    /// Site settings.
    pub site: SiteConfig,
    /// Retention sweep settings.
    pub retention: RetentionConfig,
    /// Per-sensor producer settings.
    pub sensors: SensorsConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return every problem found.
    ///
    /// This checks:
    /// - Server bind address is valid (host:port format)
    /// - Export directory is not empty
    /// - UTC offset is within -23..=23 hours
    /// - Producer intervals are between 1 second and 7 days
    /// - Seed counts are at most 1000
    ///
    /// # Example
    ///
    /// ```
    /// use greenhouse_service::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.server.validate());
        errors.extend(self.export.validate());
        errors.extend(self.site.validate());
        errors.extend(self.retention.validate());
        errors.extend(self.sensors.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError::new(
                "server.bind",
                "bind address cannot be empty",
            ));
            return errors;
        }

        let Some((_, port)) = self.bind.rsplit_once(':') else {
            errors.push(ValidationError::new(
                "server.bind",
                format!(
                    "invalid bind address '{}': expected format 'host:port'",
                    self.bind
                ),
            ));
            return errors;
        };

        match port.parse::<u16>() {
            Ok(0) => errors.push(ValidationError::new("server.bind", "port cannot be 0")),
            Err(_) => errors.push(ValidationError::new(
                "server.bind",
                format!("invalid port '{}': must be a number 1-65535", port),
            )),
            Ok(_) => {}
        }

        errors
    }
}

/// Snapshot export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving `datos_sensores_*.json` files.
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

impl ExportConfig {
    /// Validate export configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.directory.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "export.directory",
                "export directory cannot be empty",
            ));
        }
        errors
    }
}

/// Site configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Offset from UTC, in hours, used to pick the hour of day for the
    /// temperature profile.
    pub utc_offset_hours: i8,
}

impl SiteConfig {
    /// The configured offset, or UTC if it is out of range.
    pub fn utc_offset(&self) -> UtcOffset {
        UtcOffset::from_hms(self.utc_offset_hours, 0, 0).unwrap_or(UtcOffset::UTC)
    }

    /// Validate site configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if !(-23..=23).contains(&self.utc_offset_hours) {
            errors.push(ValidationError::new(
                "site.utc_offset_hours",
                format!(
                    "utc offset {} is out of range (-23 to 23 hours)",
                    self.utc_offset_hours
                ),
            ));
        }
        errors
    }
}

/// Retention sweep configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Seconds between sweeps of expired readings (0 disables the sweep).
    pub sweep_interval: u64,
}

impl RetentionConfig {
    /// The sweep interval, if the sweep is enabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval > 0).then(|| Duration::from_secs(self.sweep_interval))
    }

    /// Validate retention configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.sweep_interval > MAX_INTERVAL {
            errors.push(ValidationError::new(
                "retention.sweep_interval",
                format!(
                    "sweep interval {} is too long (maximum {} seconds / 7 days)",
                    self.sweep_interval, MAX_INTERVAL
                ),
            ));
        }
        errors
    }
}

/// Producer settings for every sensor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorsConfig {
    /// Temperature sensor.
    pub temperature: SensorConfig,
    /// Humidity sensor.
    pub humidity: SensorConfig,
    /// pH sensor.
    pub ph: SensorConfig,
}

/// Producer settings for one sensor.
///
/// Unset fields fall back to the sensor kind's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Seconds between produced readings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    /// Readings generated at start-up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_count: Option<usize>,
}

/// Minimum producer interval in seconds.
pub const MIN_INTERVAL: u64 = 1;
/// Maximum producer interval in seconds (7 days).
pub const MAX_INTERVAL: u64 = 7 * 24 * 3600;
/// Maximum number of seeded readings per sensor.
pub const MAX_SEED_COUNT: usize = 1000;

impl SensorsConfig {
    /// Settings for `kind`.
    pub fn get(&self, kind: SensorKind) -> &SensorConfig {
        match kind {
            SensorKind::Temperature => &self.temperature,
            SensorKind::Humidity => &self.humidity,
            SensorKind::Ph => &self.ph,
        }
    }

    /// Effective producer interval for `kind`.
    pub fn interval(&self, kind: SensorKind) -> Duration {
        self.get(kind)
            .interval
            .map(Duration::from_secs)
            .unwrap_or_else(|| kind.default_interval())
    }

    /// Effective seed count for `kind`.
    pub fn seed_count(&self, kind: SensorKind) -> usize {
        self.get(kind)
            .seed_count
            .unwrap_or_else(|| kind.default_seed_count())
    }

    /// Validate every sensor's settings.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for kind in SensorKind::ALL {
            let config = self.get(kind);
            let prefix = format!("sensors.{}", kind);

            if let Some(interval) = config.interval {
                if interval < MIN_INTERVAL {
                    errors.push(ValidationError::new(
                        format!("{}.interval", prefix),
                        format!(
                            "interval {} is too short (minimum {} second)",
                            interval, MIN_INTERVAL
                        ),
                    ));
                } else if interval > MAX_INTERVAL {
                    errors.push(ValidationError::new(
                        format!("{}.interval", prefix),
                        format!(
                            "interval {} is too long (maximum {} seconds / 7 days)",
                            interval, MAX_INTERVAL
                        ),
                    ));
                }
            }

            if let Some(count) = config.seed_count
                && count > MAX_SEED_COUNT
            {
                errors.push(ValidationError::new(
                    format!("{}.seed_count", prefix),
                    format!(
                        "seed count {} is too large (maximum {})",
                        count, MAX_SEED_COUNT
                    ),
                ));
            }
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind` or `sensors.ph.interval`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("greenhouse")
        .join("server.toml")
}
