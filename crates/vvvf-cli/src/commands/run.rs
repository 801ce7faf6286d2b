//! Run command implementation
//!
//! Starts the real-time engine and feeds it a telemetry profile at
//! wall-clock speed, printing engine statistics as it goes.

use anyhow::{Context, Result};
use colored::Colorize;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};
use vvvf_backend_audio::{Inverter, NullSink, PlaybackSink, TelemetryProfile, WavSink};
use vvvf_spec::InverterConfig;

use super::{load_config, load_profile, Preset};

/// Run the run command
///
/// # Arguments
/// * `profile_path` - Telemetry profile JSON
/// * `output_path` - Optional WAV file receiving played buffers
/// * `config_path` - Optional configuration JSON; the preset is used otherwise
/// * `preset` - Built-in preset
/// * `stats_interval_ms` - Statistics printout interval, 0 to disable
pub fn run(
    profile_path: &str,
    output_path: Option<&str>,
    config_path: Option<&str>,
    preset: Preset,
    stats_interval_ms: u64,
) -> Result<ExitCode> {
    let mut config = load_config(config_path, preset)?;
    let profile = load_profile(profile_path)?;

    let sink: Box<dyn PlaybackSink> = match output_path {
        Some(path) => {
            // Keep the file's timeline continuous through silent ranges.
            config.pipeline.play_silent_buffers = true;
            Box::new(
                WavSink::create(path, config.pipeline.sample_rate)
                    .with_context(|| format!("Failed to create WAV file: {}", path))?,
            )
        }
        None => Box::new(NullSink),
    };

    println!(
        "{} {} ({:.1} s)",
        "Running:".cyan().bold(),
        profile_path,
        profile.duration_s()
    );

    let mut inverter = Inverter::new(config.clone(), sink)?;
    inverter.start()?;
    drive(&inverter, &config, &profile, stats_interval_ms);
    inverter.stop()?;

    let stats = inverter.stats();
    println!("{}", stats);
    if stats.starvation_count > 0 {
        println!(
            "{} playback starved {} time(s)",
            "!".yellow(),
            stats.starvation_count
        );
    }
    println!(
        "\n{} {} samples played",
        "SUCCESS".green().bold(),
        stats.consumed_samples
    );
    Ok(ExitCode::SUCCESS)
}

/// Pushes profile telemetry into the running engine until the profile ends.
fn drive(
    inverter: &Inverter,
    config: &InverterConfig,
    profile: &TelemetryProfile,
    stats_interval_ms: u64,
) {
    let update_period = Duration::from_secs_f32(1.0 / profile.update_rate_hz);
    let stats_interval = Duration::from_millis(stats_interval_ms);
    let duration = Duration::from_secs_f32(profile.duration_s());
    let started = Instant::now();
    let mut last_stats = started;

    log::debug!(
        "Replaying profile at {} Hz into a {} Hz engine",
        profile.update_rate_hz,
        config.pipeline.sample_rate
    );

    loop {
        let elapsed = started.elapsed();
        let sample = profile.sample_at(elapsed.as_secs_f32());
        inverter.set_motor_poles(sample.poles);
        inverter.set_motor_current(sample.current_a);
        inverter.set_motor_frequency(sample.frequency_hz);

        if stats_interval_ms > 0 && last_stats.elapsed() >= stats_interval {
            println!("{}\n", inverter.stats());
            last_stats = Instant::now();
        }

        if elapsed >= duration {
            break;
        }
        thread::sleep(update_period);
    }
}
