//! Carrier and command waveform primitives.
//!
//! All functions take a phase in `[0, 2π)` and return a signed 8-bit sample.

use std::f32::consts::PI;

use vvvf_spec::CarrierShape;

/// Full cycle in radians.
pub const TWO_PI: f32 = 2.0 * PI;

/// Peak sample value.
pub const PULSE_MAX: i8 = 127;

/// Entries in the command sine table.
pub const SINE_TABLE_SIZE: usize = 100;

/// Duty used by [`pulse`] when the configured duty is outside `(0, 1)`.
pub const DEFAULT_PULSE_DUTY: f32 = 0.03;

/// One full sine cycle, `round(127 * sin(2π i / 100))`.
pub const SINE_TABLE: [i8; SINE_TABLE_SIZE] = [
    0, 8, 16, 24, 32, 39, 47, 54, 61, 68, //
    75, 81, 87, 93, 98, 103, 107, 111, 115, 118, //
    121, 123, 125, 126, 127, 127, 127, 126, 125, 123, //
    121, 118, 115, 111, 107, 103, 98, 93, 87, 81, //
    75, 68, 61, 54, 47, 39, 32, 24, 16, 8, //
    0, -8, -16, -24, -32, -39, -47, -54, -61, -68, //
    -75, -81, -87, -93, -98, -103, -107, -111, -115, -118, //
    -121, -123, -125, -126, -127, -127, -127, -126, -125, -123, //
    -121, -118, -115, -111, -107, -103, -98, -93, -87, -81, //
    -75, -68, -61, -54, -47, -39, -32, -24, -16, -8, //
];

/// Phase accumulator that wraps into `[0, 2π)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Phase(f32);

impl Phase {
    /// Creates a phase at zero.
    pub fn new() -> Self {
        Self(0.0)
    }

    /// Current phase in radians.
    pub fn radians(&self) -> f32 {
        self.0
    }

    /// Advances by one sample of `frequency` Hz at `sample_rate` and returns
    /// the new phase.
    #[inline]
    pub fn advance(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        self.0 = wrap_phase(self.0 + TWO_PI * frequency / sample_rate);
        self.0
    }

    /// Resets the phase to zero.
    pub fn reset(&mut self) {
        self.0 = 0.0;
    }
}

/// Wraps any finite phase into `[0, 2π)`.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    if (0.0..TWO_PI).contains(&phase) {
        return phase;
    }
    if !phase.is_finite() {
        return 0.0;
    }
    let wrapped = phase.rem_euclid(TWO_PI);
    // rem_euclid can round up to exactly 2π for tiny negative inputs.
    if wrapped >= TWO_PI {
        0.0
    } else {
        wrapped
    }
}

#[inline]
fn to_sample(value: f32) -> i8 {
    value.round().clamp(-(PULSE_MAX as f32), PULSE_MAX as f32) as i8
}

/// Table sine.
#[inline]
pub fn sine_lut(phase: f32) -> i8 {
    let index = (phase * SINE_TABLE_SIZE as f32 / TWO_PI) as usize % SINE_TABLE_SIZE;
    SINE_TABLE[index]
}

/// Rising ramp from `-127` at phase 0 to `+127` at the end of the cycle.
#[inline]
pub fn sawtooth(phase: f32) -> i8 {
    to_sample(phase / TWO_PI * 2.0 * PULSE_MAX as f32 - PULSE_MAX as f32)
}

/// Square wave, high for the first half cycle.
#[inline]
pub fn square(phase: f32) -> i8 {
    if phase < PI {
        PULSE_MAX
    } else {
        -PULSE_MAX
    }
}

/// Triangle wave, `-127` at phase 0, `+127` at half cycle.
#[inline]
pub fn triangle(phase: f32) -> i8 {
    let unit = if phase < PI {
        phase / PI
    } else {
        1.0 - (phase - PI) / PI
    };
    to_sample((2.0 * unit - 1.0) * PULSE_MAX as f32)
}

/// Phase-shifted pulse pair: a negative pulse at the start of the cycle and
/// a positive one at half cycle, each `duty` of the cycle wide.
#[inline]
pub fn pulse(phase: f32, duty: f32) -> i8 {
    let duty = if duty <= 0.0 || duty >= 1.0 || !duty.is_finite() {
        DEFAULT_PULSE_DUTY
    } else {
        duty
    };
    let width = TWO_PI * duty;

    if phase < width {
        -PULSE_MAX
    } else if (PI..PI + width).contains(&phase) {
        PULSE_MAX
    } else {
        0
    }
}

/// Evaluates a carrier shape at `phase`.
#[inline]
pub fn carrier(shape: CarrierShape, phase: f32) -> i8 {
    match shape {
        CarrierShape::Sawtooth => sawtooth(phase),
        CarrierShape::Sine => sine_lut(phase),
        CarrierShape::Square => square(phase),
        CarrierShape::Triangle => triangle(phase),
        CarrierShape::Pulse { duty } => pulse(phase, duty),
    }
}

/// Three-level sine-triangle comparison used by pulse-width modulation.
///
/// Returns `+127` while the command exceeds the carrier on the positive half,
/// `-127` while it falls below the mirrored carrier on the negative half,
/// and `0` otherwise.
#[inline]
pub fn spwm(command: i8, carrier: i8) -> i8 {
    let command = command as i16;
    let carrier = carrier as i16;
    if command > 0 && command > carrier {
        PULSE_MAX
    } else if command < 0 && command < -carrier {
        -PULSE_MAX
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_table_quadrants() {
        assert_eq!(sine_lut(0.0), 0);
        assert_eq!(sine_lut(TWO_PI * 0.25), 127);
        assert_eq!(sine_lut(TWO_PI * 0.75), -127);
        assert_eq!(SINE_TABLE.iter().map(|&v| v as i32).sum::<i32>(), 0);
    }

    #[test]
    fn test_sawtooth_spans_signed_range() {
        assert_eq!(sawtooth(0.0), -127);
        assert_eq!(sawtooth(PI), 0);
        assert!(sawtooth(TWO_PI - 1e-4) >= 126);
    }

    #[test]
    fn test_sawtooth_is_monotonic() {
        let mut prev = i8::MIN;
        for i in 0..628 {
            let s = sawtooth(i as f32 * 0.01);
            assert!(s >= prev);
            prev = s;
        }
    }

    #[test]
    fn test_square_and_triangle() {
        assert_eq!(square(0.1), 127);
        assert_eq!(square(PI + 0.1), -127);
        assert_eq!(triangle(0.0), -127);
        assert_eq!(triangle(PI), 127);
        assert_eq!(triangle(PI * 0.5), 0);
    }

    #[test]
    fn test_pulse_positions() {
        assert_eq!(pulse(0.0, 0.1), -127);
        assert_eq!(pulse(1.0, 0.1), 0);
        assert_eq!(pulse(PI + 0.1, 0.1), 127);
        assert_eq!(pulse(PI + 1.0, 0.1), 0);
    }

    #[test]
    fn test_pulse_invalid_duty_falls_back() {
        let width = TWO_PI * DEFAULT_PULSE_DUTY;
        assert_eq!(pulse(width * 0.5, 1.5), -127);
        assert_eq!(pulse(width * 1.5, -0.2), 0);
    }

    #[test]
    fn test_wrap_phase() {
        assert_eq!(wrap_phase(1.0), 1.0);
        assert!((wrap_phase(TWO_PI + 1.0) - 1.0).abs() < 1e-5);
        assert!((wrap_phase(-1.0) - (TWO_PI - 1.0)).abs() < 1e-5);
        assert_eq!(wrap_phase(f32::NAN), 0.0);
        let tiny = wrap_phase(-1e-9);
        assert!((0.0..TWO_PI).contains(&tiny));
    }

    #[test]
    fn test_phase_accumulator_wraps() {
        let mut phase = Phase::new();
        for _ in 0..1000 {
            let p = phase.advance(6000.0, 25000.0);
            assert!((0.0..TWO_PI).contains(&p));
        }
    }

    #[test]
    fn test_spwm_levels() {
        assert_eq!(spwm(100, 50), 127);
        assert_eq!(spwm(40, 50), 0);
        assert_eq!(spwm(-100, 50), -127);
        assert_eq!(spwm(-40, 50), 0);
        assert_eq!(spwm(0, -127), 0);
    }
}
