//! End-to-end engine scenarios: telemetry in, carrier out.

use vvvf_backend_audio::amplitude::AmplitudeShaper;
use vvvf_backend_audio::{Controller, WaveformEngine};
use vvvf_spec::{
    AmplitudeConfig, Behaviors, InverterConfig, RotorState, TelemetryConfig, WaveformKind,
    WaveformSpec,
};

fn single_range(min: f32, max: f32, spec: WaveformSpec) -> InverterConfig {
    InverterConfig::builder()
        .range(min, max, Behaviors::uniform(spec))
        .telemetry(TelemetryConfig { window: 1 })
        .build()
}

fn generate_once(config: &InverterConfig, controller: &Controller) -> (bool, f32, Vec<i8>) {
    let params = controller.params();
    let mut engine = WaveformEngine::new(config.pipeline.sample_rate, config.generator);
    let mut buffer = vec![0i8; config.pipeline.buffer_length];
    let enabled = engine.generate(
        &mut buffer,
        &params.active_range,
        params.rotor_state,
        params.command_hz,
        params.pole_count,
        config.hz_to_kmh_factor,
    );
    (enabled, engine.carrier_frequency(), buffer)
}

#[test]
fn test_fixed_async_range_plays_6000_hz() {
    let config = single_range(-1.0, 31.0, WaveformSpec::FixedAsync { carrier_hz: 6000.0 });
    let mut controller = Controller::new(config.clone());
    controller.set_motor_poles(4);
    controller.set_motor_current(50.0);
    // 80 Hz / 4 poles = 20 rev/s = 20 km/h at the unit factor.
    let params = controller.set_motor_frequency(80.0);
    assert_eq!(params.speed_kmh, 20.0);

    let (enabled, carrier, buffer) = generate_once(&config, &controller);
    assert!(enabled);
    assert_eq!(carrier, 6000.0);
    assert!(buffer.iter().any(|&s| s != 0));
}

#[test]
fn test_sync_range_locks_to_rotor() {
    let config = single_range(7.5, 12.0, WaveformSpec::Sync { pulse_count: 7 });
    let mut controller = Controller::new(config.clone());
    controller.set_motor_poles(2);
    controller.set_motor_current(50.0);
    let params = controller.set_motor_frequency(50.0);

    // 50 Hz / 2 poles = 25 km/h is outside [7.5, 12]; the range is silent.
    assert!(params.active_range.is_sentinel());

    // Drop to 20 Hz: 10 km/h, inside the range. Carrier = 20 / 2 * 7.
    controller.set_motor_frequency(20.0);
    let (enabled, carrier, _) = generate_once(&config, &controller);
    assert!(enabled);
    assert_eq!(carrier, 70.0);
}

#[test]
fn test_sync_carrier_at_50_hz_two_poles() {
    let config = single_range(7.5, 30.0, WaveformSpec::Sync { pulse_count: 7 });
    let mut controller = Controller::new(config.clone());
    controller.set_motor_poles(2);
    controller.set_motor_current(50.0);
    controller.set_motor_frequency(50.0);

    let (enabled, carrier, _) = generate_once(&config, &controller);
    assert!(enabled);
    assert_eq!(carrier, 175.0);
    assert_eq!(controller.params().waveform_kind(), WaveformKind::Sync);
}

#[test]
fn test_amplitude_band_clamps() {
    let shaper = AmplitudeShaper::new(AmplitudeConfig {
        min_current: 0.0,
        max_current: 100.0,
        min_voltage: 0.0,
        max_voltage: 1.0,
        base: 0.0,
        ..AmplitudeConfig::default()
    });
    assert_eq!(shaper.shape(-5.0, 10.0), 0.0);
    assert_eq!(shaper.shape(150.0, 10.0), 1.0);
}

#[test]
fn test_gap_between_ranges_is_silent() {
    let config = InverterConfig::builder()
        .range(
            0.0,
            10.0,
            Behaviors::uniform(WaveformSpec::FixedAsync { carrier_hz: 1000.0 }),
        )
        .range(
            20.0,
            30.0,
            Behaviors::uniform(WaveformSpec::FixedAsync { carrier_hz: 2000.0 }),
        )
        .telemetry(TelemetryConfig { window: 1 })
        .build();
    let mut controller = Controller::new(config.clone());
    controller.set_motor_poles(2);
    controller.set_motor_current(50.0);
    controller.set_motor_frequency(30.0);

    let (enabled, _, buffer) = generate_once(&config, &controller);
    assert!(!enabled);
    assert!(buffer.iter().all(|&s| s == 0));
}

#[test]
fn test_deceleration_selects_decelerating_behavior() {
    let behaviors = Behaviors {
        accelerating: WaveformSpec::FixedAsync { carrier_hz: 1000.0 },
        coasting: WaveformSpec::FixedAsync { carrier_hz: 1500.0 },
        decelerating: WaveformSpec::FixedAsync { carrier_hz: 800.0 },
    };
    let config = InverterConfig::builder()
        .range(0.0, 100.0, behaviors)
        .telemetry(TelemetryConfig { window: 1 })
        .build();
    let mut controller = Controller::new(config.clone());
    controller.set_motor_poles(2);
    controller.set_motor_current(50.0);
    for _ in 0..10 {
        controller.set_motor_frequency(100.0);
    }
    let params = controller.set_motor_frequency(60.0);
    assert_eq!(params.rotor_state, RotorState::Decelerating);

    let (_, carrier, _) = generate_once(&config, &controller);
    assert_eq!(carrier, 800.0);
}

#[test]
fn test_traction_preset_covers_the_speed_band() {
    let config = InverterConfig::traction_preset();
    assert!(config.validate().is_ok());
    for speed in [5.0, 20.0, 50.0, 90.0] {
        assert!(
            !config.lookup(speed, 80.0).is_sentinel(),
            "no range at {} km/h",
            speed
        );
    }
}
