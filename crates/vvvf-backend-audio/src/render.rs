//! Offline rendering from a scripted telemetry profile.
//!
//! Runs the same controller and waveform engine as the real-time path, but
//! synchronously on the calling thread: telemetry updates are replayed at a
//! fixed rate from a [`TelemetryProfile`] and every buffer goes straight to
//! a sink. Useful for producing reference recordings and for tests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vvvf_spec::{InverterConfig, RotorState, WaveformKind};

use crate::controller::Controller;
use crate::error::{EngineError, EngineResult, SinkError};
use crate::generator::WaveformEngine;
use crate::sink::{apply_gain, PlaybackSink};

fn default_poles() -> u32 {
    4
}

fn default_update_rate_hz() -> f32 {
    100.0
}

/// Telemetry at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryKeyframe {
    /// Time in seconds from the start of the profile.
    pub time_s: f32,
    /// Phase current in A.
    pub current_a: f32,
    /// Electrical frequency in Hz.
    pub frequency_hz: f32,
    /// Pole count from this keyframe on; defaults to the profile's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poles: Option<u32>,
}

/// Interpolated telemetry at an arbitrary time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    /// Phase current in A.
    pub current_a: f32,
    /// Electrical frequency in Hz.
    pub frequency_hz: f32,
    /// Pole count.
    pub poles: u32,
}

/// A scripted drive: keyframes linearly interpolated over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryProfile {
    /// Pole count used until a keyframe overrides it.
    #[serde(default = "default_poles")]
    pub poles: u32,
    /// How often telemetry is pushed into the controller (Hz).
    #[serde(default = "default_update_rate_hz")]
    pub update_rate_hz: f32,
    /// Keyframes in ascending time order.
    pub keyframes: Vec<TelemetryKeyframe>,
}

impl TelemetryProfile {
    /// Parses and validates a profile from JSON.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reads a profile from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Checks keyframe ordering and the update rate.
    pub fn validate(&self) -> EngineResult<()> {
        if self.keyframes.is_empty() {
            return Err(EngineError::invalid_profile("profile has no keyframes"));
        }
        if !(self.update_rate_hz.is_finite() && self.update_rate_hz > 0.0) {
            return Err(EngineError::invalid_profile(format!(
                "update_rate_hz must be positive, got {}",
                self.update_rate_hz
            )));
        }

        let mut previous = 0.0f32;
        for (i, frame) in self.keyframes.iter().enumerate() {
            let values = [frame.time_s, frame.current_a, frame.frequency_hz];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(EngineError::invalid_profile(format!(
                    "keyframe {} has a non-finite value",
                    i
                )));
            }
            if frame.time_s < previous {
                return Err(EngineError::invalid_profile(format!(
                    "keyframe {} at {} s comes before {} s",
                    i, frame.time_s, previous
                )));
            }
            previous = frame.time_s;
        }
        Ok(())
    }

    /// Time of the last keyframe.
    pub fn duration_s(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |frame| frame.time_s.max(0.0))
    }

    /// Telemetry at `time_s`, held constant outside the keyframe span.
    pub fn sample_at(&self, time_s: f32) -> TelemetrySample {
        let poles = self
            .keyframes
            .iter()
            .take_while(|frame| frame.time_s <= time_s)
            .filter_map(|frame| frame.poles)
            .last()
            .unwrap_or(self.poles);

        let next = self.keyframes.iter().position(|frame| frame.time_s > time_s);
        let (current_a, frequency_hz) = match next {
            None => self
                .keyframes
                .last()
                .map_or((0.0, 0.0), |frame| (frame.current_a, frame.frequency_hz)),
            Some(0) => {
                let frame = &self.keyframes[0];
                (frame.current_a, frame.frequency_hz)
            }
            Some(i) => {
                let a = &self.keyframes[i - 1];
                let b = &self.keyframes[i];
                let t = (time_s - a.time_s) / (b.time_s - a.time_s);
                (
                    a.current_a + (b.current_a - a.current_a) * t,
                    a.frequency_hz + (b.frequency_hz - a.frequency_hz) * t,
                )
            }
        };

        TelemetrySample {
            current_a,
            frequency_hz,
            poles,
        }
    }
}

/// Parameters in effect for one rendered buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferTrace {
    /// Start time of the buffer in seconds.
    pub time_s: f32,
    /// Vehicle speed in km/h.
    pub speed_kmh: f32,
    /// Rotor state.
    pub rotor_state: RotorState,
    /// Waveform played.
    pub waveform: WaveformKind,
    /// Carrier frequency in Hz (0 when silent).
    pub carrier_hz: f32,
    /// Output gain.
    pub amplitude: f32,
}

/// Summary of an offline render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderReport {
    /// Sample rate of the output.
    pub sample_rate: u32,
    /// Samples delivered to the sink.
    pub samples: u64,
    /// Buffers that carried sound.
    pub enabled_buffers: usize,
    /// Buffers that were silent.
    pub silent_buffers: usize,
    /// Per-buffer parameters, in order.
    pub trace: Vec<BufferTrace>,
}

/// Renders `profile` into `sink`, then finishes the sink.
///
/// The final buffer is truncated to the profile's duration.
pub fn render_into<S>(
    config: &InverterConfig,
    profile: &TelemetryProfile,
    sink: &mut S,
) -> EngineResult<RenderReport>
where
    S: PlaybackSink + ?Sized,
{
    config.validate()?;
    profile.validate()?;

    let sample_rate = config.pipeline.sample_rate;
    let buffer_length = config.pipeline.buffer_length;
    let total = (profile.duration_s() as f64 * sample_rate as f64).round() as u64;
    let update_step = 1.0 / profile.update_rate_hz as f64;

    let mut controller = Controller::new(config.clone());
    let mut engine = WaveformEngine::new(sample_rate, config.generator);
    let mut buffer = vec![0i8; buffer_length];
    let mut report = RenderReport {
        sample_rate,
        ..RenderReport::default()
    };
    let mut next_update = 0.0f64;

    log::debug!(
        "Rendering {:.2} s ({} samples) at {} Hz",
        profile.duration_s(),
        total,
        sample_rate
    );

    while report.samples < total {
        let start_s = report.samples as f64 / sample_rate as f64;
        while next_update <= start_s {
            let sample = profile.sample_at(next_update as f32);
            controller.set_motor_poles(sample.poles);
            controller.set_motor_current(sample.current_a);
            controller.set_motor_frequency(sample.frequency_hz);
            next_update += update_step;
        }

        let params = controller.params();
        let enabled = engine.generate(
            &mut buffer,
            &params.active_range,
            params.rotor_state,
            params.command_hz,
            params.pole_count,
            config.hz_to_kmh_factor,
        );

        let len = buffer_length.min((total - report.samples) as usize);
        sink.play(&buffer[..len], sample_rate, params.amplitude)?;

        report.samples += len as u64;
        if enabled {
            report.enabled_buffers += 1;
        } else {
            report.silent_buffers += 1;
        }
        report.trace.push(BufferTrace {
            time_s: start_s as f32,
            speed_kmh: params.speed_kmh,
            rotor_state: params.rotor_state,
            waveform: params.waveform_kind(),
            carrier_hz: if enabled { engine.carrier_frequency() } else { 0.0 },
            amplitude: params.amplitude,
        });
    }

    sink.finish()?;
    Ok(report)
}

struct GainedSamples(Vec<i8>);

impl PlaybackSink for GainedSamples {
    fn play(&mut self, samples: &[i8], _sample_rate: u32, gain: f32) -> Result<(), SinkError> {
        self.0.extend(samples.iter().map(|&sample| apply_gain(sample, gain)));
        Ok(())
    }
}

/// Renders `profile` to samples with the output gain applied.
pub fn render(config: &InverterConfig, profile: &TelemetryProfile) -> EngineResult<Vec<i8>> {
    let mut out = GainedSamples(Vec::new());
    render_into(config, profile, &mut out)?;
    Ok(out.0)
}
