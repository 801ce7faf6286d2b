//! Output gain from motor current and speed.

use vvvf_spec::AmplitudeConfig;

/// Linearly maps `value` from `[in_min, in_max]` onto `[out_min, out_max]`,
/// clamping to the output endpoints outside the input band.
///
/// A degenerate input band (`in_min == in_max`) returns `out_min`.
pub fn map_value(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    if in_min == in_max {
        return out_min;
    }

    let (lo, hi, at_lo, at_hi) = if in_min < in_max {
        (in_min, in_max, out_min, out_max)
    } else {
        (in_max, in_min, out_max, out_min)
    };

    if value.is_nan() || value <= lo {
        return at_lo;
    }
    if value >= hi {
        return at_hi;
    }

    out_min + (value - in_min) / (in_max - in_min) * (out_max - out_min)
}

/// Maps averaged current and speed to a gain in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct AmplitudeShaper {
    config: AmplitudeConfig,
}

impl AmplitudeShaper {
    /// Creates a shaper.
    pub fn new(config: AmplitudeConfig) -> Self {
        Self { config }
    }

    /// Computes the gain for an averaged current (A) and speed (km/h).
    pub fn shape(&self, avg_current: f32, speed_kmh: f32) -> f32 {
        let c = &self.config;
        let from_current = map_value(
            avg_current,
            c.min_current,
            c.max_current,
            c.min_voltage,
            c.max_voltage,
        );
        let speed_scale = map_value(
            speed_kmh,
            c.speed_ramp_start_kmh,
            c.speed_ramp_end_kmh,
            c.speed_scalar_start,
            c.speed_scalar_end,
        );

        ((from_current + c.base) * speed_scale).clamp(0.0, 1.0)
    }

    /// The active configuration.
    pub fn config(&self) -> &AmplitudeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_band() -> AmplitudeShaper {
        AmplitudeShaper::new(AmplitudeConfig {
            min_current: 0.0,
            max_current: 100.0,
            min_voltage: 0.0,
            max_voltage: 1.0,
            base: 0.0,
            speed_ramp_start_kmh: 28.0,
            speed_ramp_end_kmh: 31.0,
            speed_scalar_start: 1.0,
            speed_scalar_end: 0.0,
        })
    }

    #[test]
    fn test_map_value_linear() {
        assert_eq!(map_value(5.0, 0.0, 10.0, 0.0, 1.0), 0.5);
        assert_eq!(map_value(29.5, 28.0, 31.0, 1.0, 0.0), 0.5);
    }

    #[test]
    fn test_map_value_clamps() {
        assert_eq!(map_value(-1.0, 0.0, 10.0, 0.2, 0.8), 0.2);
        assert_eq!(map_value(11.0, 0.0, 10.0, 0.2, 0.8), 0.8);
    }

    #[test]
    fn test_map_value_degenerate_band() {
        assert_eq!(map_value(3.0, 5.0, 5.0, 0.25, 0.75), 0.25);
    }

    #[test]
    fn test_map_value_descending_input_band() {
        assert_eq!(map_value(0.0, 10.0, 0.0, 0.0, 1.0), 1.0);
        assert_eq!(map_value(20.0, 10.0, 0.0, 0.0, 1.0), 0.0);
        assert_eq!(map_value(5.0, 10.0, 0.0, 0.0, 1.0), 0.5);
    }

    #[test]
    fn test_shape_clamps_current() {
        let shaper = unit_band();
        assert_eq!(shaper.shape(-5.0, 10.0), 0.0);
        assert_eq!(shaper.shape(150.0, 10.0), 1.0);
        assert_eq!(shaper.shape(50.0, 10.0), 0.5);
    }

    #[test]
    fn test_shape_fades_with_speed() {
        let shaper = unit_band();
        assert_eq!(shaper.shape(100.0, 29.5), 0.5);
        assert_eq!(shaper.shape(100.0, 40.0), 0.0);
    }

    #[test]
    fn test_shape_monotonic_in_current() {
        let shaper = AmplitudeShaper::new(AmplitudeConfig::default());
        let mut prev = 0.0;
        for i in 0..=130 {
            let gain = shaper.shape(i as f32, 10.0);
            assert!(gain >= prev);
            assert!(gain >= 0.0);
            prev = gain;
        }
    }

    #[test]
    fn test_shape_never_negative() {
        let shaper = AmplitudeShaper::new(AmplitudeConfig {
            base: -2.0,
            ..AmplitudeConfig::default()
        });
        assert_eq!(shaper.shape(60.0, 10.0), 0.0);
    }
}
