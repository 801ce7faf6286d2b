//! Configuration file round trips and lookup properties over whole tables.

use pretty_assertions::assert_eq;
use vvvf_spec::{
    Behaviors, ConfigError, InverterConfig, LookupLimits, RotorState, SpeedRange,
    SpeedRangeTable, WaveformSpec, MAX_SPEED_RANGES,
};

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inverter.json");

    let config = InverterConfig::traction_preset();
    std::fs::write(&path, config.to_json_pretty().unwrap()).unwrap();

    let loaded = InverterConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_json_uses_defaults() {
    let json = r#"{
        "hz_to_kmh_factor": 2.0,
        "ranges": [
            {
                "min_speed_kmh": 0.0,
                "max_speed_kmh": 40.0,
                "behaviors": {
                    "accelerating": {"type": "sync", "pulse_count": 9},
                    "coasting": {"type": "disabled"},
                    "decelerating": {"type": "resonant", "carrier_hz_min": 400.0, "carrier_hz_max": 700.0}
                }
            }
        ]
    }"#;
    let config = InverterConfig::from_json(json).unwrap();

    assert_eq!(config.hz_to_kmh_factor, 2.0);
    assert_eq!(config.pipeline.sample_rate, 25_000);
    assert_eq!(config.limits, LookupLimits::default());
    let range = config.ranges.get(0).unwrap();
    assert_eq!(
        range.spec_for(RotorState::Accelerating),
        &WaveformSpec::Sync { pulse_count: 9 }
    );
    assert_eq!(range.spec_for(RotorState::Coasting), &WaveformSpec::Disabled);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = InverterConfig::from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_overlapping_ranges_rejected_on_load() {
    let json = r#"{
        "ranges": [
            {"min_speed_kmh": 0.0, "max_speed_kmh": 20.0, "behaviors": {}},
            {"min_speed_kmh": 10.0, "max_speed_kmh": 30.0, "behaviors": {}}
        ]
    }"#;
    let err = InverterConfig::from_json(json).unwrap_err();
    assert!(matches!(err, ConfigError::UnorderedRanges { index: 1, .. }));
}

#[test]
fn test_lookup_result_always_contains_speed_or_is_sentinel() {
    let config = InverterConfig::traction_preset();
    let limits = config.limits;
    let mut speed = -5.0f32;
    while speed < 250.0 {
        for current in [0.0f32, 2.0, 50.0] {
            let range = config.ranges.lookup(speed, current, &limits);
            if range.is_sentinel() {
                continue;
            }
            let capped = speed.min(limits.max_speed_kmh);
            let first = config.ranges.get(0).unwrap();
            let margin = if range == *first {
                limits.first_range_margin_kmh
            } else {
                0.0
            };
            assert!(
                range.min_speed_kmh - margin <= capped && capped <= range.max_speed_kmh,
                "{} km/h mapped to {:?}",
                speed,
                range
            );
        }
        speed += 0.25;
    }
}

#[test]
fn test_full_table_lookup_reaches_last_range() {
    let mut table = SpeedRangeTable::new();
    for i in 0..MAX_SPEED_RANGES {
        let min = i as f32 * 10.0;
        table
            .push(SpeedRange::new(
                min,
                min + 10.0,
                Behaviors::uniform(WaveformSpec::FixedAsync {
                    carrier_hz: 100.0 + i as f32,
                }),
            ))
            .unwrap();
    }
    let limits = LookupLimits {
        max_speed_kmh: 1_000.0,
        ..LookupLimits::default()
    };

    let last = table.lookup(155.0, 0.0, &limits);
    assert_eq!(
        last.spec_for(RotorState::Coasting),
        &WaveformSpec::FixedAsync { carrier_hz: 115.0 }
    );
    assert!(table.lookup(165.0, 0.0, &limits).is_sentinel());
}
