//! Configuration validation.
//!
//! The runtime never fails on bad numbers: it clamps. Validation is where
//! malformed tables and nonsensical tuning get reported, before a config is
//! handed to the engine.

use crate::config::InverterConfig;
use crate::error::ConfigError;
use crate::waveform::{RotorState, WaveformSpec};

/// Validates a configuration and returns every problem found.
///
/// # Returns
/// An empty vector if the configuration is valid.
pub fn validate_config(config: &InverterConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    check_positive(&mut errors, "hz_to_kmh_factor", config.hz_to_kmh_factor);
    check_positive(&mut errors, "limits.max_speed_kmh", config.limits.max_speed_kmh);
    check_finite(
        &mut errors,
        "limits.zero_speed_cutoff_kmh",
        config.limits.zero_speed_cutoff_kmh,
    );
    check_finite(
        &mut errors,
        "limits.excitation_current_threshold",
        config.limits.excitation_current_threshold,
    );
    check_non_negative(
        &mut errors,
        "limits.first_range_margin_kmh",
        config.limits.first_range_margin_kmh,
    );

    validate_ranges(config, &mut errors);

    let amp = &config.amplitude;
    for (name, value) in [
        ("amplitude.min_current", amp.min_current),
        ("amplitude.max_current", amp.max_current),
        ("amplitude.min_voltage", amp.min_voltage),
        ("amplitude.max_voltage", amp.max_voltage),
        ("amplitude.base", amp.base),
        ("amplitude.speed_ramp_start_kmh", amp.speed_ramp_start_kmh),
        ("amplitude.speed_ramp_end_kmh", amp.speed_ramp_end_kmh),
        ("amplitude.speed_scalar_start", amp.speed_scalar_start),
        ("amplitude.speed_scalar_end", amp.speed_scalar_end),
    ] {
        check_finite(&mut errors, name, value);
    }

    check_non_negative(
        &mut errors,
        "classifier.coasting_threshold",
        config.classifier.coasting_threshold,
    );
    if config.classifier.history_size == 0 {
        errors.push(ConfigError::invalid_param(
            "classifier.history_size",
            "must be at least 1",
        ));
    }
    if config.telemetry.window == 0 {
        errors.push(ConfigError::invalid_param(
            "telemetry.window",
            "must be at least 1",
        ));
    }

    let pipeline = &config.pipeline;
    if pipeline.sample_rate == 0 {
        errors.push(ConfigError::invalid_param(
            "pipeline.sample_rate",
            "must be positive",
        ));
    }
    if pipeline.buffer_length == 0 {
        errors.push(ConfigError::invalid_param(
            "pipeline.buffer_length",
            "must be positive",
        ));
    }
    if pipeline.buffer_count == 0 {
        errors.push(ConfigError::invalid_param(
            "pipeline.buffer_count",
            "must be at least 1",
        ));
    }
    check_positive(
        &mut errors,
        "pipeline.rate_warning_factor",
        pipeline.rate_warning_factor,
    );

    if config.generator.resonant_redraw_interval == 0 {
        errors.push(ConfigError::invalid_param(
            "generator.resonant_redraw_interval",
            "must be at least 1",
        ));
    }

    errors
}

fn validate_ranges(config: &InverterConfig, errors: &mut Vec<ConfigError>) {
    let mut previous_max: Option<f32> = None;

    for (index, range) in config.ranges.iter().enumerate() {
        let min = range.min_speed_kmh;
        let max = range.max_speed_kmh;

        if !min.is_finite() || !max.is_finite() {
            errors.push(ConfigError::invalid_param(
                format!("ranges[{}]", index),
                "speed bounds must be finite",
            ));
            continue;
        }
        if min > max {
            errors.push(ConfigError::InvertedRange { index, min, max });
        }
        if let Some(previous_max) = previous_max {
            if min < previous_max {
                errors.push(ConfigError::UnorderedRanges {
                    index,
                    min,
                    previous_max,
                });
            }
        }
        previous_max = Some(max);

        for (state, spec) in range.behaviors.iter() {
            if let Err(message) = check_waveform(spec) {
                errors.push(waveform_error(index, state, message));
            }
        }
    }
}

fn check_waveform(spec: &WaveformSpec) -> Result<(), String> {
    let positive = |name: &str, hz: f32| {
        if hz.is_finite() && hz > 0.0 {
            Ok(())
        } else {
            Err(format!("{} must be a positive frequency, got {}", name, hz))
        }
    };

    match *spec {
        WaveformSpec::Disabled => Ok(()),
        WaveformSpec::FixedAsync { carrier_hz } => positive("carrier_hz", carrier_hz),
        WaveformSpec::RampAsync {
            carrier_hz_start,
            carrier_hz_end,
        } => {
            positive("carrier_hz_start", carrier_hz_start)?;
            positive("carrier_hz_end", carrier_hz_end)
        }
        WaveformSpec::Resonant {
            carrier_hz_min,
            carrier_hz_max,
        } => {
            positive("carrier_hz_min", carrier_hz_min)?;
            positive("carrier_hz_max", carrier_hz_max)?;
            if carrier_hz_min > carrier_hz_max {
                return Err(format!(
                    "carrier_hz_min {} exceeds carrier_hz_max {}",
                    carrier_hz_min, carrier_hz_max
                ));
            }
            Ok(())
        }
        WaveformSpec::Sync { pulse_count } => {
            if pulse_count == 0 {
                Err("pulse_count must be at least 1".to_string())
            } else {
                Ok(())
            }
        }
    }
}

fn waveform_error(index: usize, state: RotorState, message: String) -> ConfigError {
    ConfigError::InvalidWaveform {
        index,
        state: state.to_string(),
        message,
    }
}

fn check_finite(errors: &mut Vec<ConfigError>, name: &str, value: f32) {
    if !value.is_finite() {
        errors.push(ConfigError::invalid_param(name, "must be finite"));
    }
}

fn check_positive(errors: &mut Vec<ConfigError>, name: &str, value: f32) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(ConfigError::invalid_param(
            name,
            format!("must be positive, got {}", value),
        ));
    }
}

fn check_non_negative(errors: &mut Vec<ConfigError>, name: &str, value: f32) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(ConfigError::invalid_param(
            name,
            format!("must be non-negative, got {}", value),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::range::{SpeedRange, SpeedRangeTable};
    use crate::waveform::Behaviors;

    fn config_with_ranges(ranges: Vec<SpeedRange>) -> InverterConfig {
        InverterConfig {
            ranges: SpeedRangeTable::try_from(ranges).unwrap(),
            ..InverterConfig::default()
        }
    }

    fn sync(pulses: u32) -> Behaviors {
        Behaviors::uniform(WaveformSpec::Sync {
            pulse_count: pulses,
        })
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&InverterConfig::default()).is_empty());
    }

    #[test]
    fn test_touching_ranges_are_valid() {
        let config = config_with_ranges(vec![
            SpeedRange::new(0.0, 10.0, sync(7)),
            SpeedRange::new(10.0, 20.0, sync(3)),
        ]);
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_overlapping_ranges_rejected() {
        let config = config_with_ranges(vec![
            SpeedRange::new(0.0, 10.0, sync(7)),
            SpeedRange::new(8.0, 20.0, sync(3)),
        ]);
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ConfigError::UnorderedRanges { index: 1, .. }
        ));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let config = config_with_ranges(vec![SpeedRange::new(12.0, 7.5, sync(7))]);
        let errors = validate_config(&config);
        assert!(matches!(errors[0], ConfigError::InvertedRange { index: 0, .. }));
    }

    #[test]
    fn test_bad_waveforms_rejected() {
        let config = config_with_ranges(vec![SpeedRange::new(
            0.0,
            10.0,
            Behaviors {
                accelerating: WaveformSpec::Sync { pulse_count: 0 },
                coasting: WaveformSpec::Resonant {
                    carrier_hz_min: 900.0,
                    carrier_hz_max: 400.0,
                },
                decelerating: WaveformSpec::FixedAsync { carrier_hz: -5.0 },
            },
        )]);
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 3);
        assert!(errors[1].to_string().contains("Coasting"));
    }

    #[test]
    fn test_zero_sized_pipeline_rejected() {
        let config = InverterConfig {
            pipeline: PipelineConfig {
                sample_rate: 0,
                buffer_length: 0,
                buffer_count: 0,
                ..PipelineConfig::default()
            },
            ..InverterConfig::default()
        };
        assert_eq!(validate_config(&config).len(), 3);
    }

    #[test]
    fn test_nan_factor_rejected() {
        let config = InverterConfig {
            hz_to_kmh_factor: f32::NAN,
            ..InverterConfig::default()
        };
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "CONFIG_005");
    }
}
