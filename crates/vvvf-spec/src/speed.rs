//! Conversions between motor electrical frequency and vehicle speed.

use std::f32::consts::PI;

/// Mechanical rotor frequency (rev/s) for an electrical `command_hz`.
///
/// A pole count of zero means the motor has not been described yet; the
/// rotor is then treated as stationary.
pub fn rotor_frequency_hz(command_hz: f32, pole_count: u32) -> f32 {
    if pole_count == 0 {
        return 0.0;
    }
    command_hz / pole_count as f32
}

/// Vehicle speed in km/h for an electrical `command_hz`.
pub fn speed_kmh(command_hz: f32, pole_count: u32, hz_to_kmh_factor: f32) -> f32 {
    rotor_frequency_hz(command_hz, pole_count) * hz_to_kmh_factor
}

/// km/h travelled per rotor revolution per second for a wheel of `diameter_mm`.
///
/// Assumes direct drive; multiply by any gear ratio separately.
pub fn wheel_diameter_to_kmh_factor(diameter_mm: f32) -> f32 {
    const MM_PER_KM: f32 = 1_000_000.0;
    const SECONDS_PER_HOUR: f32 = 3600.0;
    PI * diameter_mm / MM_PER_KM * SECONDS_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotor_frequency_divides_by_poles() {
        assert_eq!(rotor_frequency_hz(50.0, 2), 25.0);
        assert_eq!(rotor_frequency_hz(50.0, 0), 0.0);
    }

    #[test]
    fn test_speed_uses_factor() {
        assert_eq!(speed_kmh(40.0, 4, 2.0), 20.0);
    }

    #[test]
    fn test_wheel_factor() {
        // A 1 m wheel at one rev/s covers pi metres per second.
        let factor = wheel_diameter_to_kmh_factor(1000.0);
        assert!((factor - PI * 3.6).abs() < 1e-4);
    }
}
