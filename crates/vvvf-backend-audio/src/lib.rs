//! VVVF Inverter Sound Engine
//!
//! This crate turns motor telemetry into a synthetic traction inverter whine:
//! a carrier waveform whose frequency and pattern follow the vehicle's speed,
//! rotor state and load, the way a railway VVVF drive sounds.
//!
//! # Overview
//!
//! Telemetry (phase current, electrical frequency, pole count) is smoothed,
//! converted to a speed, and used to pick a speed range from the
//! configuration. The range's behavior for the current rotor state selects
//! the carrier:
//!
//! - **Fixed async** - constant carrier frequency
//! - **Ramp async** - carrier swept across the range's speed span
//! - **Resonant** - carrier re-randomized every few samples
//! - **Sync** - carrier locked to a multiple of the rotor frequency
//!
//! Samples are signed 8-bit. In real time they flow through a small pool of
//! fixed-length buffers between a generator thread and a playback thread.
//!
//! # Determinism
//!
//! Given the same configuration and telemetry sequence, offline rendering is
//! byte-identical across runs. The resonant carrier uses a fixed-seed
//! table-plus-LFSR generator.
//!
//! # Example
//!
//! ```
//! use vvvf_backend_audio::{render, TelemetryProfile};
//! use vvvf_spec::InverterConfig;
//!
//! let profile = TelemetryProfile::from_json(r#"{
//!     "poles": 4,
//!     "keyframes": [
//!         {"time_s": 0.0, "current_a": 60.0, "frequency_hz": 0.0},
//!         {"time_s": 0.5, "current_a": 60.0, "frequency_hz": 80.0}
//!     ]
//! }"#).unwrap();
//!
//! let samples = render(&InverterConfig::default(), &profile).unwrap();
//! assert_eq!(samples.len(), 12_500);
//! ```
//!
//! # Crate Structure
//!
//! - [`Inverter`] - Real-time engine: start/stop, telemetry setters, stats
//! - [`render()`] - Offline rendering from a telemetry profile
//! - [`amplitude`] - Output gain from current and speed
//! - [`classifier`] - Accelerating/coasting/decelerating detection
//! - [`controller`] - Telemetry to derived parameters
//! - [`generator`] - Waveform engine
//! - [`oscillator`] - Carrier shapes and the command sine table
//! - [`pipeline`] - Producer/consumer buffer hand-off
//! - [`rng`] - Deterministic carrier jitter
//! - [`sink`] - Playback sinks (null, memory, WAV)
//! - [`stats`] - Counters and the diagnostic snapshot
//! - [`telemetry`] - Rolling averages

pub mod amplitude;
pub mod classifier;
pub mod controller;
pub mod error;
pub mod generator;
pub mod inverter;
pub mod oscillator;
pub mod pipeline;
pub mod render;
pub mod rng;
pub mod sink;
pub mod stats;
pub mod telemetry;

// Re-export main types at crate root
pub use controller::{Controller, DerivedParams};
pub use error::{EngineError, EngineResult, SinkError};
pub use generator::{GeneratorState, WaveformEngine};
pub use inverter::Inverter;
pub use render::{
    render, render_into, BufferTrace, RenderReport, TelemetryKeyframe, TelemetryProfile,
};
pub use sink::{Capture, MemorySink, NullSink, PlaybackSink, WavSink};
pub use stats::EngineStats;
