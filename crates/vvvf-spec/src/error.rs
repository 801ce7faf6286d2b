//! Error types for configuration loading and validation.

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building, loading or validating an inverter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// More ranges than the table can hold.
    #[error("speed range table is full (capacity {capacity})")]
    TableFull {
        /// Maximum number of ranges.
        capacity: usize,
    },

    /// A range whose minimum exceeds its maximum.
    #[error("range {index}: min speed {min} km/h exceeds max speed {max} km/h")]
    InvertedRange {
        /// Index of the offending range.
        index: usize,
        /// Stated minimum speed.
        min: f32,
        /// Stated maximum speed.
        max: f32,
    },

    /// Ranges out of ascending order or overlapping.
    #[error("range {index}: starts at {min} km/h, before the previous range ends at {previous_max} km/h")]
    UnorderedRanges {
        /// Index of the offending range.
        index: usize,
        /// Stated minimum speed.
        min: f32,
        /// Maximum speed of the preceding range.
        previous_max: f32,
    },

    /// An invalid waveform behavior.
    #[error("range {index} ({state}): {message}")]
    InvalidWaveform {
        /// Index of the offending range.
        index: usize,
        /// Rotor state the behavior belongs to.
        state: String,
        /// Error message.
        message: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// JSON parse or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns a stable error code string.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::TableFull { .. } => "CONFIG_001",
            ConfigError::InvertedRange { .. } => "CONFIG_002",
            ConfigError::UnorderedRanges { .. } => "CONFIG_003",
            ConfigError::InvalidWaveform { .. } => "CONFIG_004",
            ConfigError::InvalidParameter { .. } => "CONFIG_005",
            ConfigError::Json(_) => "CONFIG_006",
            ConfigError::Io(_) => "CONFIG_007",
        }
    }
}
