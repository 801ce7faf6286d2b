//! Inverter configuration and its builder.
//!
//! Every constant the sound model depends on lives here so a vehicle can be
//! tuned without rebuilding: the speed-range table, lookup thresholds, the
//! amplitude ramps, the classifier window, and the pipeline timing.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::range::{LookupLimits, SpeedRange, SpeedRangeTable, MAX_SPEED_RANGES};
use crate::speed;
use crate::validation::validate_config;
use crate::waveform::{Behaviors, RotorState, WaveformSpec};

/// Current and speed ramps that shape the output gain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmplitudeConfig {
    /// Current (A) at which the gain ramp starts.
    pub min_current: f32,
    /// Current (A) at which the gain ramp ends.
    pub max_current: f32,
    /// Gain at `min_current`.
    pub min_voltage: f32,
    /// Gain at `max_current`.
    pub max_voltage: f32,
    /// Offset added to the current-derived gain.
    pub base: f32,
    /// Speed (km/h) at which the fade-out ramp starts.
    pub speed_ramp_start_kmh: f32,
    /// Speed (km/h) at which the fade-out ramp ends.
    pub speed_ramp_end_kmh: f32,
    /// Scale factor at `speed_ramp_start_kmh`.
    pub speed_scalar_start: f32,
    /// Scale factor at `speed_ramp_end_kmh`.
    pub speed_scalar_end: f32,
}

impl Default for AmplitudeConfig {
    fn default() -> Self {
        Self {
            min_current: 5.0,
            max_current: 120.0,
            min_voltage: 0.0,
            max_voltage: 0.5,
            base: 0.0,
            speed_ramp_start_kmh: 28.0,
            speed_ramp_end_kmh: 31.0,
            speed_scalar_start: 1.0,
            speed_scalar_end: 0.0,
        }
    }
}

/// Rotor state classifier tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Maximum deviation from the window mean still considered coasting (rev/s).
    pub coasting_threshold: f32,
    /// Number of samples in the history window.
    pub history_size: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            coasting_threshold: 0.1,
            history_size: 5,
        }
    }
}

/// Telemetry smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Number of samples averaged for current and frequency.
    pub window: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { window: 5 }
    }
}

/// Buffer pipeline sizing and timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per buffer.
    pub buffer_length: usize,
    /// Number of buffers cycling between producer and consumer.
    pub buffer_count: usize,
    /// How long either side waits before re-checking the running flag (µs).
    pub poll_interval_us: u64,
    /// Starvation is only reported after this much time since start (ms).
    pub startup_grace_ms: u64,
    /// Sleep for the buffer's nominal duration after each play call.
    pub compensate_playback: bool,
    /// Hand silent (disabled) buffers to the sink instead of skipping them.
    pub play_silent_buffers: bool,
    /// Generated rate above `sample_rate * factor` is reported as a warning.
    pub rate_warning_factor: f32,
    /// Stack size of the generator and playback threads (bytes).
    pub thread_stack_size: usize,
}

impl PipelineConfig {
    /// Nominal playback duration of one buffer in microseconds.
    pub fn buffer_duration_us(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.buffer_length as u64 * 1_000_000 / self.sample_rate as u64
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 25_000,
            buffer_length: 150,
            buffer_count: 3,
            poll_interval_us: 1_000,
            startup_grace_ms: 1_000,
            compensate_playback: true,
            play_silent_buffers: false,
            rate_warning_factor: 1.2,
            thread_stack_size: 256 * 1024,
        }
    }
}

/// How output samples are derived from the carrier and command phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Emit the bare carrier waveform.
    #[default]
    Carrier,
    /// Compare a command sine against the carrier and emit three-level pulses.
    Spwm,
}

/// Shape of the carrier waveform.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum CarrierShape {
    /// Rising ramp over the full signed range.
    #[default]
    Sawtooth,
    /// Sine wave.
    Sine,
    /// 50% square wave.
    Square,
    /// Symmetric triangle.
    Triangle,
    /// Negative pulse at the cycle start, positive pulse at half cycle.
    Pulse {
        /// Pulse width as a fraction of the cycle, in `(0, 1)`.
        duty: f32,
    },
}

/// Waveform engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Output derivation.
    pub output_mode: OutputMode,
    /// Carrier waveform shape.
    pub carrier_shape: CarrierShape,
    /// Samples between re-draws of a resonant carrier.
    pub resonant_redraw_interval: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::Carrier,
            carrier_shape: CarrierShape::Sawtooth,
            resonant_redraw_interval: 10,
        }
    }
}

/// Complete inverter sound configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InverterConfig {
    /// km/h per rotor revolution per second.
    pub hz_to_kmh_factor: f32,
    /// Lookup thresholds.
    pub limits: LookupLimits,
    /// Ordered speed ranges.
    pub ranges: SpeedRangeTable,
    /// Gain shaping.
    pub amplitude: AmplitudeConfig,
    /// Rotor state classifier.
    pub classifier: ClassifierConfig,
    /// Telemetry averaging.
    pub telemetry: TelemetryConfig,
    /// Buffer pipeline.
    pub pipeline: PipelineConfig,
    /// Waveform engine.
    pub generator: GeneratorConfig,
}

impl Default for InverterConfig {
    /// A single fixed 6 kHz carrier from standstill up to 31 km/h.
    fn default() -> Self {
        InverterConfig::builder()
            .range(
                -1.0,
                31.0,
                Behaviors::uniform(WaveformSpec::FixedAsync { carrier_hz: 6000.0 }),
            )
            .build()
    }
}

impl InverterConfig {
    /// Creates a new builder.
    pub fn builder() -> InverterConfigBuilder {
        InverterConfigBuilder::new()
    }

    /// Multi-range railway pattern: ramped async start, stepped synchronous
    /// pulse counts, and a single-pulse top range.
    pub fn traction_preset() -> Self {
        let fixed = |hz| WaveformSpec::FixedAsync { carrier_hz: hz };
        let ramp = |start, end| WaveformSpec::RampAsync {
            carrier_hz_start: start,
            carrier_hz_end: end,
        };
        let sync = |pulses| WaveformSpec::Sync {
            pulse_count: pulses,
        };

        InverterConfig::builder()
            .range(-1.0, 5.0, Behaviors::uniform(ramp(250.0, 500.0)))
            .range(5.0, 20.0, Behaviors::uniform(fixed(500.0)))
            .range(
                20.0,
                21.0,
                Behaviors {
                    accelerating: ramp(500.0, 300.0),
                    coasting: ramp(500.0, 300.0),
                    decelerating: fixed(500.0),
                },
            )
            .range(21.0, 27.0, Behaviors::uniform(sync(11)))
            .range(27.0, 40.0, Behaviors::uniform(sync(7)))
            .range(40.0, 48.0, Behaviors::uniform(sync(3)))
            .range(48.0, 55.0, Behaviors::uniform(sync(3)))
            .range(
                55.0,
                150.0,
                Behaviors {
                    accelerating: sync(1),
                    coasting: sync(3),
                    decelerating: sync(1),
                },
            )
            .amplitude(AmplitudeConfig {
                speed_ramp_start_kmh: 140.0,
                speed_ramp_end_kmh: 150.0,
                ..AmplitudeConfig::default()
            })
            .build()
    }

    /// Parses a configuration from JSON and validates it.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: InverterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the first validation error, if any.
    pub fn validate(&self) -> ConfigResult<()> {
        match validate_config(self).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Finds the active range for a speed and averaged motor current.
    pub fn lookup(&self, speed_kmh: f32, motor_current: f32) -> SpeedRange {
        self.ranges.lookup(speed_kmh, motor_current, &self.limits)
    }

    /// Vehicle speed in km/h for an electrical frequency and pole count.
    pub fn speed_kmh(&self, command_hz: f32, pole_count: u32) -> f32 {
        speed::speed_kmh(command_hz, pole_count, self.hz_to_kmh_factor)
    }
}

impl fmt::Display for InverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Inverter Configuration:")?;
        writeln!(f, "  Speed Factor: {:.6} km/h per rev/s", self.hz_to_kmh_factor)?;
        writeln!(f, "  Max Speed: {:.1} km/h", self.limits.max_speed_kmh)?;
        writeln!(
            f,
            "  Idle Cutoff: below {:.1} km/h and {:.1} A",
            self.limits.zero_speed_cutoff_kmh, self.limits.excitation_current_threshold
        )?;
        writeln!(
            f,
            "  Sample Rate: {} Hz, {} buffers of {} samples",
            self.pipeline.sample_rate, self.pipeline.buffer_count, self.pipeline.buffer_length
        )?;
        writeln!(f, "  Number of Speed Ranges: {}", self.ranges.len())?;
        for (i, range) in self.ranges.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "Speed Range {}:", i + 1)?;
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct PendingRange {
    bounds: Option<(f32, f32)>,
    behaviors: Behaviors,
}

/// Builder for [`InverterConfig`].
///
/// Ranges are addressed by index, mirroring how vehicle tables are usually
/// written out. Indices at or beyond [`MAX_SPEED_RANGES`] are dropped, as are
/// slots that never receive bounds. Ranges must be given in ascending order.
#[derive(Debug, Clone)]
pub struct InverterConfigBuilder {
    config: InverterConfig,
    slots: Vec<PendingRange>,
}

impl InverterConfigBuilder {
    /// Creates a builder with default tuning and no ranges.
    pub fn new() -> Self {
        Self {
            config: InverterConfig {
                hz_to_kmh_factor: 1.0,
                limits: LookupLimits::default(),
                ranges: SpeedRangeTable::new(),
                amplitude: AmplitudeConfig::default(),
                classifier: ClassifierConfig::default(),
                telemetry: TelemetryConfig::default(),
                pipeline: PipelineConfig::default(),
                generator: GeneratorConfig::default(),
            },
            slots: vec![PendingRange::default(); MAX_SPEED_RANGES],
        }
    }

    fn slot(&mut self, index: usize) -> Option<&mut PendingRange> {
        let slot = self.slots.get_mut(index);
        if slot.is_none() {
            log::debug!(
                "dropping speed range {}: table holds {} ranges",
                index,
                MAX_SPEED_RANGES
            );
        }
        slot
    }

    /// Sets the bounds of the range at `index`.
    pub fn set_range_speed(mut self, index: usize, min_kmh: f32, max_kmh: f32) -> Self {
        if let Some(slot) = self.slot(index) {
            slot.bounds = Some((min_kmh, max_kmh));
        }
        self
    }

    /// Sets the behavior of the range at `index` for one rotor state.
    pub fn set_behavior(mut self, index: usize, state: RotorState, spec: WaveformSpec) -> Self {
        if let Some(slot) = self.slot(index) {
            slot.behaviors.set(state, spec);
        }
        self
    }

    /// Sets the same behavior for every rotor state of the range at `index`.
    pub fn set_all_behaviors(mut self, index: usize, spec: WaveformSpec) -> Self {
        if let Some(slot) = self.slot(index) {
            slot.behaviors = Behaviors::uniform(spec);
        }
        self
    }

    /// Appends a range after the last one with bounds.
    pub fn range(self, min_kmh: f32, max_kmh: f32, behaviors: Behaviors) -> Self {
        let index = self
            .slots
            .iter()
            .rposition(|slot| slot.bounds.is_some())
            .map_or(0, |i| i + 1);
        let mut builder = self.set_range_speed(index, min_kmh, max_kmh);
        if let Some(slot) = builder.slots.get_mut(index) {
            slot.behaviors = behaviors;
        }
        builder
    }

    /// Sets the km/h per rev/s conversion factor.
    pub fn hz_to_kmh_factor(mut self, factor: f32) -> Self {
        self.config.hz_to_kmh_factor = factor;
        self
    }

    /// Derives the conversion factor from a wheel diameter in millimetres.
    pub fn wheel_diameter_mm(self, diameter_mm: f32) -> Self {
        self.hz_to_kmh_factor(speed::wheel_diameter_to_kmh_factor(diameter_mm))
    }

    /// Sets the lookup thresholds.
    pub fn limits(mut self, limits: LookupLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Sets the amplitude shaping.
    pub fn amplitude(mut self, amplitude: AmplitudeConfig) -> Self {
        self.config.amplitude = amplitude;
        self
    }

    /// Sets the classifier tuning.
    pub fn classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.config.classifier = classifier;
        self
    }

    /// Sets the telemetry averaging window.
    pub fn telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.config.telemetry = telemetry;
        self
    }

    /// Sets the pipeline sizing.
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.config.pipeline = pipeline;
        self
    }

    /// Sets the waveform engine tuning.
    pub fn generator(mut self, generator: GeneratorConfig) -> Self {
        self.config.generator = generator;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> InverterConfig {
        let mut config = self.config;
        for (index, slot) in self.slots.into_iter().enumerate() {
            if let Some((min, max)) = slot.bounds {
                let range = SpeedRange::new(min, max, slot.behaviors);
                if let Err(e) = config.ranges.push(range) {
                    log::debug!("dropping speed range {}: {}", index, e);
                }
            }
        }
        config
    }
}

impl Default for InverterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
