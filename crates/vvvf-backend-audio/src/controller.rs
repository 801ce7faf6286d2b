//! Telemetry-to-parameters controller.
//!
//! The [`Controller`] turns raw telemetry updates into the [`DerivedParams`]
//! the generator consumes: averaged current and frequency, speed, rotor
//! state, the active speed range and the output gain. It is updated on the
//! caller's thread and read once per buffer by the generator thread.

use vvvf_spec::{
    rotor_frequency_hz, InverterConfig, RotorState, SpeedRange, WaveformKind, SENTINEL_RANGE,
};

use crate::amplitude::AmplitudeShaper;
use crate::classifier::RotorStateClassifier;
use crate::telemetry::TelemetryAverager;

/// Snapshot of everything derived from telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedParams {
    /// Averaged electrical (command) frequency in Hz.
    pub command_hz: f32,
    /// Averaged phase current in A.
    pub avg_current: f32,
    /// Motor pole count.
    pub pole_count: u32,
    /// Vehicle speed in km/h.
    pub speed_kmh: f32,
    /// Classified rotor state.
    pub rotor_state: RotorState,
    /// Range selected for the current speed and current.
    pub active_range: SpeedRange,
    /// Output gain in `[0, 1]`.
    pub amplitude: f32,
}

impl DerivedParams {
    /// Kind of waveform the active range plays in the current rotor state.
    pub fn waveform_kind(&self) -> WaveformKind {
        self.active_range.spec_for(self.rotor_state).kind()
    }
}

impl Default for DerivedParams {
    fn default() -> Self {
        Self {
            command_hz: 0.0,
            avg_current: 0.0,
            pole_count: 0,
            speed_kmh: 0.0,
            rotor_state: RotorState::Coasting,
            active_range: SENTINEL_RANGE,
            amplitude: 0.0,
        }
    }
}

/// Owns the averagers, classifier and shaper for one inverter.
#[derive(Debug, Clone)]
pub struct Controller {
    config: InverterConfig,
    telemetry: TelemetryAverager,
    classifier: RotorStateClassifier,
    shaper: AmplitudeShaper,
    params: DerivedParams,
}

impl Controller {
    /// Creates a controller at rest.
    pub fn new(config: InverterConfig) -> Self {
        Self {
            telemetry: TelemetryAverager::new(&config.telemetry),
            classifier: RotorStateClassifier::new(&config.classifier),
            shaper: AmplitudeShaper::new(config.amplitude),
            params: DerivedParams::default(),
            config,
        }
    }

    /// Feeds a phase current sample in amps.
    pub fn set_motor_current(&mut self, amps: f32) -> DerivedParams {
        if !amps.is_finite() {
            log::warn!("Ignoring non-finite motor current: {}", amps);
            return self.params;
        }
        self.telemetry.push_current(amps);
        self.refresh();
        self.params
    }

    /// Feeds an electrical frequency sample in Hz.
    pub fn set_motor_frequency(&mut self, hz: f32) -> DerivedParams {
        if !hz.is_finite() {
            log::warn!("Ignoring non-finite motor frequency: {}", hz);
            return self.params;
        }
        self.telemetry.push_frequency(hz);
        self.refresh();
        self.params
    }

    /// Sets the motor pole count.
    pub fn set_motor_poles(&mut self, poles: u32) -> DerivedParams {
        self.telemetry.set_pole_count(poles);
        self.refresh();
        self.params
    }

    /// Latest derived parameters.
    pub fn params(&self) -> DerivedParams {
        self.params
    }

    /// The configuration this controller was built from.
    pub fn config(&self) -> &InverterConfig {
        &self.config
    }

    /// Reclassifies the rotor and recomputes everything else. Runs on every
    /// accepted telemetry update, whichever channel it arrived on.
    fn refresh(&mut self) {
        let command_hz = self.telemetry.frequency();
        let avg_current = self.telemetry.current();
        let pole_count = self.telemetry.pole_count();
        let speed_kmh = self.config.speed_kmh(command_hz, pole_count);
        let rotor_state = self
            .classifier
            .classify(rotor_frequency_hz(command_hz, pole_count));

        self.params = DerivedParams {
            command_hz,
            avg_current,
            pole_count,
            speed_kmh,
            rotor_state,
            active_range: self.config.lookup(speed_kmh, avg_current),
            amplitude: self.shaper.shape(avg_current, speed_kmh),
        };
    }
}
