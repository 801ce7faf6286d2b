//! Waveform engine: fills sample buffers from the active speed range.
//!
//! The engine owns all phase state, so consecutive buffers join without
//! discontinuities. Carrier frequency is derived per buffer from the
//! [`WaveformSpec`] selected by the rotor state, except for resonant specs,
//! which re-draw it every `resonant_redraw_interval` samples.

use vvvf_spec::{
    rotor_frequency_hz, speed_kmh, GeneratorConfig, OutputMode, RotorState, SpeedRange,
    WaveformSpec,
};

use crate::oscillator::{self, Phase};
use crate::rng::CarrierJitter;

/// Mutable per-engine oscillator state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeneratorState {
    /// Carrier phase in `[0, 2π)`.
    pub carrier_phase: Phase,
    /// Command (fundamental) phase in `[0, 2π)`.
    pub command_phase: Phase,
    /// Carrier frequency in Hz.
    pub carrier_frequency: f32,
    /// Command frequency in Hz.
    pub command_frequency: f32,
}

/// Carrier frequency of a ramp spec at `speed_kmh` within `range`.
///
/// The position is clamped to the range, so speeds inside the first range's
/// lower margin play the start frequency.
pub fn ramp_carrier_hz(start_hz: f32, end_hz: f32, range: &SpeedRange, speed_kmh: f32) -> f32 {
    let span = range.span();
    if span == 0.0 || !speed_kmh.is_finite() {
        return start_hz;
    }
    let ratio = ((speed_kmh - range.min_speed_kmh) / span).clamp(0.0, 1.0);
    start_hz + (end_hz - start_hz) * ratio
}

/// Carrier frequency of a sync spec: rotor frequency times pulse count.
pub fn sync_carrier_hz(command_hz: f32, pole_count: u32, pulse_count: u32) -> f32 {
    (rotor_frequency_hz(command_hz, pole_count) * pulse_count as f32).abs()
}

/// Produces signed 8-bit carrier samples.
#[derive(Debug, Clone)]
pub struct WaveformEngine {
    state: GeneratorState,
    sample_rate: f32,
    config: GeneratorConfig,
    jitter: CarrierJitter,
}

impl WaveformEngine {
    /// Creates an engine for `sample_rate` Hz.
    pub fn new(sample_rate: u32, config: GeneratorConfig) -> Self {
        Self {
            state: GeneratorState::default(),
            sample_rate: sample_rate.max(1) as f32,
            config,
            jitter: CarrierJitter::new(),
        }
    }

    /// Current oscillator state.
    pub fn state(&self) -> &GeneratorState {
        &self.state
    }

    /// Carrier frequency used for the last generated sample.
    pub fn carrier_frequency(&self) -> f32 {
        self.state.carrier_frequency
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Resets phases and frequencies to zero.
    pub fn reset(&mut self) {
        self.state = GeneratorState::default();
        self.jitter = CarrierJitter::new();
    }

    fn nyquist(&self) -> f32 {
        self.sample_rate / 2.0
    }

    fn draw_resonant(&mut self, min_hz: f32, max_hz: f32) -> f32 {
        self.jitter.frequency(min_hz, max_hz).min(self.nyquist())
    }

    /// Fills `buffer` with samples for the given range and rotor state.
    ///
    /// # Arguments
    /// * `buffer` - Output samples, fully overwritten
    /// * `range` - Active speed range
    /// * `rotor_state` - Selects the range's behavior
    /// * `command_hz` - Motor electrical frequency
    /// * `pole_count` - Motor pole count; zero is treated as a stopped rotor
    /// * `hz_to_kmh_factor` - km/h per rotor rev/s, for ramp interpolation
    ///
    /// # Returns
    /// `false` if the behavior is disabled and the buffer was zero-filled.
    pub fn generate(
        &mut self,
        buffer: &mut [i8],
        range: &SpeedRange,
        rotor_state: RotorState,
        command_hz: f32,
        pole_count: u32,
        hz_to_kmh_factor: f32,
    ) -> bool {
        let spec = *range.spec_for(rotor_state);
        if !spec.is_enabled() {
            buffer.fill(0);
            return false;
        }

        let command_hz = if command_hz.is_finite() { command_hz } else { 0.0 };
        let speed = speed_kmh(command_hz, pole_count, hz_to_kmh_factor);
        self.state.command_frequency = command_hz;

        let nyquist = self.nyquist();
        let steady_carrier = match spec {
            WaveformSpec::Disabled => 0.0,
            WaveformSpec::FixedAsync { carrier_hz } => carrier_hz,
            WaveformSpec::RampAsync {
                carrier_hz_start,
                carrier_hz_end,
            } => ramp_carrier_hz(carrier_hz_start, carrier_hz_end, range, speed),
            WaveformSpec::Sync { pulse_count } => {
                sync_carrier_hz(command_hz, pole_count, pulse_count)
            }
            WaveformSpec::Resonant { .. } => self.state.carrier_frequency,
        };
        self.state.carrier_frequency = steady_carrier.clamp(0.0, nyquist);

        let interval = self.config.resonant_redraw_interval.max(1);
        let shape = self.config.carrier_shape;
        let mode = self.config.output_mode;

        for (i, sample) in buffer.iter_mut().enumerate() {
            if let WaveformSpec::Resonant {
                carrier_hz_min,
                carrier_hz_max,
            } = spec
            {
                if i % interval == 0 {
                    self.state.carrier_frequency =
                        self.draw_resonant(carrier_hz_min, carrier_hz_max);
                }
            }

            let command_phase = self
                .state
                .command_phase
                .advance(self.state.command_frequency, self.sample_rate);
            let carrier_phase = self
                .state
                .carrier_phase
                .advance(self.state.carrier_frequency, self.sample_rate);

            let carrier = oscillator::carrier(shape, carrier_phase);
            *sample = match mode {
                OutputMode::Carrier => carrier,
                OutputMode::Spwm => oscillator::spwm(oscillator::sine_lut(command_phase), carrier),
            };
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vvvf_spec::{Behaviors, CarrierShape, SENTINEL_RANGE};

    fn range_with(spec: WaveformSpec, min: f32, max: f32) -> SpeedRange {
        SpeedRange::new(min, max, Behaviors::uniform(spec))
    }

    fn engine() -> WaveformEngine {
        WaveformEngine::new(25_000, GeneratorConfig::default())
    }

    #[test]
    fn test_disabled_zero_fills() {
        let mut engine = engine();
        let mut buffer = vec![55i8; 150];
        let enabled = engine.generate(
            &mut buffer,
            &SENTINEL_RANGE,
            RotorState::Coasting,
            50.0,
            2,
            1.0,
        );
        assert!(!enabled);
        assert!(buffer.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_fixed_async_carrier() {
        let mut engine = engine();
        let range = range_with(WaveformSpec::FixedAsync { carrier_hz: 6000.0 }, -1.0, 31.0);
        let mut buffer = vec![0i8; 150];
        assert!(engine.generate(&mut buffer, &range, RotorState::Accelerating, 20.0, 2, 1.0));
        assert_eq!(engine.carrier_frequency(), 6000.0);
    }

    #[test]
    fn test_sync_carrier() {
        let mut engine = engine();
        let range = range_with(WaveformSpec::Sync { pulse_count: 7 }, 7.5, 12.0);
        let mut buffer = vec![0i8; 150];
        engine.generate(&mut buffer, &range, RotorState::Coasting, 50.0, 2, 1.0);
        assert_eq!(engine.carrier_frequency(), 175.0);
    }

    #[test]
    fn test_sync_with_zero_poles_is_silent_carrier() {
        assert_eq!(sync_carrier_hz(50.0, 0, 7), 0.0);
    }

    #[test]
    fn test_sync_carrier_reverse_rotation_uses_magnitude() {
        assert_eq!(sync_carrier_hz(-50.0, 2, 7), 175.0);

        let mut engine = engine();
        let range = range_with(WaveformSpec::Sync { pulse_count: 7 }, -40.0, 40.0);
        let mut buffer = vec![0i8; 150];
        assert!(engine.generate(&mut buffer, &range, RotorState::Coasting, -50.0, 2, 1.0));
        assert_eq!(engine.carrier_frequency(), 175.0);
        assert_eq!(engine.state().command_frequency, -50.0);
    }

    #[test]
    fn test_sync_carrier_clamped_to_nyquist() {
        // 10 kHz / 2 poles * 9 pulses = 45 kHz, above the 12.5 kHz Nyquist limit.
        assert_eq!(sync_carrier_hz(10_000.0, 2, 9), 45_000.0);

        let mut engine = engine();
        let range = range_with(WaveformSpec::Sync { pulse_count: 9 }, 0.0, 40.0);
        let mut buffer = vec![0i8; 150];
        engine.generate(&mut buffer, &range, RotorState::Coasting, 10_000.0, 2, 1.0);
        assert_eq!(engine.carrier_frequency(), 12_500.0);
    }

    #[test]
    fn test_ramp_endpoints_and_midpoint() {
        let range = range_with(WaveformSpec::Disabled, 10.0, 20.0);
        assert_eq!(ramp_carrier_hz(250.0, 500.0, &range, 10.0), 250.0);
        assert_eq!(ramp_carrier_hz(250.0, 500.0, &range, 20.0), 500.0);
        assert_eq!(ramp_carrier_hz(250.0, 500.0, &range, 15.0), 375.0);
        // Below the stated minimum (first-range margin) clamps to the start.
        assert_eq!(ramp_carrier_hz(250.0, 500.0, &range, 9.5), 250.0);
    }

    #[test]
    fn test_ramp_degenerate_range() {
        let range = range_with(WaveformSpec::Disabled, 10.0, 10.0);
        assert_eq!(ramp_carrier_hz(250.0, 500.0, &range, 10.0), 250.0);
    }

    #[test]
    fn test_ramp_uses_converted_speed() {
        let mut engine = engine();
        let range = range_with(
            WaveformSpec::RampAsync {
                carrier_hz_start: 1000.0,
                carrier_hz_end: 2000.0,
            },
            0.0,
            40.0,
        );
        let mut buffer = vec![0i8; 10];
        // 40 Hz / 4 poles = 10 rev/s, * 2 km/h per rev/s = 20 km/h: halfway.
        engine.generate(&mut buffer, &range, RotorState::Coasting, 40.0, 4, 2.0);
        assert_eq!(engine.carrier_frequency(), 1500.0);
    }

    #[test]
    fn test_resonant_stays_in_bounds_and_varies() {
        let mut engine = engine();
        let range = range_with(
            WaveformSpec::Resonant {
                carrier_hz_min: 400.0,
                carrier_hz_max: 900.0,
            },
            0.0,
            40.0,
        );
        let mut seen = Vec::new();
        let mut buffer = vec![0i8; 10];
        for _ in 0..50 {
            engine.generate(&mut buffer, &range, RotorState::Coasting, 20.0, 2, 1.0);
            let f = engine.carrier_frequency();
            assert!((400.0..=900.0).contains(&f));
            seen.push(f);
        }
        seen.dedup();
        assert!(seen.len() > 10);
    }

    #[test]
    fn test_carrier_clamped_to_nyquist() {
        let mut engine = WaveformEngine::new(8_000, GeneratorConfig::default());
        let range = range_with(WaveformSpec::FixedAsync { carrier_hz: 6000.0 }, 0.0, 40.0);
        let mut buffer = vec![0i8; 10];
        engine.generate(&mut buffer, &range, RotorState::Coasting, 20.0, 2, 1.0);
        assert_eq!(engine.carrier_frequency(), 4000.0);
    }

    #[test]
    fn test_sawtooth_output_period() {
        // 2500 Hz at 25 kHz: one sawtooth cycle every 10 samples.
        let mut engine = engine();
        let range = range_with(WaveformSpec::FixedAsync { carrier_hz: 2500.0 }, 0.0, 40.0);
        let mut buffer = vec![0i8; 40];
        engine.generate(&mut buffer, &range, RotorState::Coasting, 20.0, 2, 1.0);

        let resets = buffer.windows(2).filter(|w| w[1] < w[0]).count();
        assert!((3..=4).contains(&resets), "resets = {}", resets);
    }

    #[test]
    fn test_phase_continuity_across_buffers() {
        let range = range_with(WaveformSpec::FixedAsync { carrier_hz: 1234.0 }, 0.0, 40.0);

        let mut whole = engine();
        let mut one = vec![0i8; 300];
        whole.generate(&mut one, &range, RotorState::Coasting, 20.0, 2, 1.0);

        let mut split = engine();
        let mut a = vec![0i8; 150];
        let mut b = vec![0i8; 150];
        split.generate(&mut a, &range, RotorState::Coasting, 20.0, 2, 1.0);
        split.generate(&mut b, &range, RotorState::Coasting, 20.0, 2, 1.0);

        a.extend_from_slice(&b);
        assert_eq!(one, a);
    }

    #[test]
    fn test_spwm_mode_is_three_level() {
        let config = GeneratorConfig {
            output_mode: OutputMode::Spwm,
            carrier_shape: CarrierShape::Triangle,
            ..GeneratorConfig::default()
        };
        let mut engine = WaveformEngine::new(25_000, config);
        let range = range_with(WaveformSpec::Sync { pulse_count: 9 }, 0.0, 40.0);
        let mut buffer = vec![0i8; 2000];
        engine.generate(&mut buffer, &range, RotorState::Coasting, 100.0, 2, 1.0);

        assert!(buffer.iter().all(|&s| s == 0 || s == 127 || s == -127));
        assert!(buffer.iter().any(|&s| s == 127));
        assert!(buffer.iter().any(|&s| s == -127));
    }

    #[test]
    fn test_rotor_state_selects_behavior() {
        let mut engine = engine();
        let range = SpeedRange::new(
            0.0,
            40.0,
            Behaviors {
                accelerating: WaveformSpec::Sync { pulse_count: 1 },
                coasting: WaveformSpec::Sync { pulse_count: 3 },
                decelerating: WaveformSpec::Disabled,
            },
        );
        let mut buffer = vec![0i8; 10];

        engine.generate(&mut buffer, &range, RotorState::Accelerating, 60.0, 2, 1.0);
        assert_eq!(engine.carrier_frequency(), 30.0);
        engine.generate(&mut buffer, &range, RotorState::Coasting, 60.0, 2, 1.0);
        assert_eq!(engine.carrier_frequency(), 90.0);
        assert!(!engine.generate(&mut buffer, &range, RotorState::Decelerating, 60.0, 2, 1.0));
    }
}
