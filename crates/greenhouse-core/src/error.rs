//! Error types for greenhouse-core.
//!
//! Appending and querying readings never fail. The only fallible operations
//! are constructing a [`crate::ValueRange`] and parsing a
//! [`crate::SensorKind`] from user input.

/// Result type for greenhouse-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in greenhouse-core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A value range whose lower bound exceeds its upper bound.
    #[error("Invalid range: min ({min}) must not exceed max ({max})")]
    InvalidRange { min: f64, max: f64 },

    /// A value range with a NaN or infinite bound.
    #[error("Invalid range: bounds must be finite (min: {min}, max: {max})")]
    NonFiniteRange { min: f64, max: f64 },

    /// A sensor name that does not match any known kind.
    #[error("Unknown sensor kind: {0}")]
    UnknownSensorKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_range_display() {
        let err = Error::InvalidRange { min: 9.0, max: 1.0 };
        assert_eq!(
            err.to_string(),
            "Invalid range: min (9) must not exceed max (1)"
        );
    }

    #[test]
    fn test_unknown_kind_display() {
        let err = Error::UnknownSensorKind("co2".to_string());
        assert!(err.to_string().contains("co2"));
    }
}
