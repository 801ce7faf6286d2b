//! VVVF Inverter Sound Configuration
//!
//! This crate holds the data model behind the synthetic inverter sound: the
//! speed-range table that decides which pulse pattern plays at a given speed,
//! the per-rotor-state waveform behaviors, and all tuning for amplitude,
//! classification, and the sample pipeline.
//!
//! # Example
//!
//! ```
//! use vvvf_spec::{Behaviors, InverterConfig, RotorState, WaveformSpec};
//!
//! let config = InverterConfig::builder()
//!     .range(7.5, 12.0, Behaviors::uniform(WaveformSpec::Sync { pulse_count: 7 }))
//!     .build();
//! assert!(config.validate().is_ok());
//!
//! let range = config.lookup(10.0, 20.0);
//! assert_eq!(
//!     range.spec_for(RotorState::Coasting),
//!     &WaveformSpec::Sync { pulse_count: 7 }
//! );
//!
//! // Nothing configured at 50 km/h: silence.
//! assert!(config.lookup(50.0, 20.0).is_sentinel());
//! ```
//!
//! # Modules
//!
//! - [`config`]: `InverterConfig`, its sub-configs, builder and presets
//! - [`error`]: Configuration errors
//! - [`range`]: Speed ranges, the bounded table, and lookup
//! - [`speed`]: Frequency to speed conversions
//! - [`validation`]: Configuration validation
//! - [`waveform`]: Waveform specs and rotor states

pub mod config;
pub mod error;
pub mod range;
pub mod speed;
pub mod validation;
pub mod waveform;

// Re-export commonly used types at the crate root
pub use config::{
    AmplitudeConfig, CarrierShape, ClassifierConfig, GeneratorConfig, InverterConfig,
    InverterConfigBuilder, OutputMode, PipelineConfig, TelemetryConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use range::{
    LookupLimits, SpeedRange, SpeedRangeTable, MAX_SPEED_RANGES, SENTINEL_MAX_SPEED_KMH,
    SENTINEL_RANGE,
};
pub use speed::{rotor_frequency_hz, speed_kmh, wheel_diameter_to_kmh_factor};
pub use validation::validate_config;
pub use waveform::{Behaviors, RotorState, WaveformKind, WaveformSpec};
