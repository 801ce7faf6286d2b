//! Error types for the sound engine.

use thiserror::Error;
use vvvf_spec::ConfigError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by a [`PlaybackSink`](crate::sink::PlaybackSink).
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink was used after being finalized.
    #[error("sink is closed")]
    Closed,

    /// WAV encoding failed.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Device or backend specific failure.
    #[error("playback failed: {message}")]
    Playback {
        /// Error message.
        message: String,
    },
}

impl SinkError {
    /// Creates a playback error.
    pub fn playback(message: impl Into<String>) -> Self {
        Self::Playback {
            message: message.into(),
        }
    }
}

/// Errors that can occur while starting or driving the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A worker thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        /// Thread name.
        name: &'static str,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Buffer allocation failed.
    #[error("failed to allocate {count} buffers of {length} samples")]
    Allocation {
        /// Requested buffer count.
        count: usize,
        /// Requested buffer length.
        length: usize,
    },

    /// A worker thread panicked.
    #[error("{name} thread panicked")]
    ThreadPanicked {
        /// Thread name.
        name: &'static str,
    },

    /// Sink failure.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Telemetry profile could not be parsed.
    #[error("failed to parse telemetry profile: {0}")]
    Profile(#[from] serde_json::Error),

    /// Telemetry profile parsed but is unusable.
    #[error("invalid telemetry profile: {message}")]
    InvalidProfile {
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates an invalid profile error.
    pub fn invalid_profile(message: impl Into<String>) -> Self {
        Self::InvalidProfile {
            message: message.into(),
        }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidConfig(_) => "ENGINE_001",
            EngineError::ThreadSpawn { .. } => "ENGINE_002",
            EngineError::Allocation { .. } => "ENGINE_003",
            EngineError::ThreadPanicked { .. } => "ENGINE_004",
            EngineError::Sink(_) => "ENGINE_005",
            EngineError::Profile(_) => "ENGINE_006",
            EngineError::InvalidProfile { .. } => "ENGINE_007",
            EngineError::Io(_) => "ENGINE_008",
        }
    }
}
