//! Render command implementation
//!
//! Replays a telemetry profile through the engine offline and writes the
//! result as an 8-bit mono WAV file.

use anyhow::{Context, Result};
use colored::Colorize;
use std::process::ExitCode;
use std::time::Instant;
use vvvf_backend_audio::{render_into, BufferTrace, WavSink};

use super::{load_config, load_profile, Preset};

/// Run the render command
///
/// # Arguments
/// * `profile_path` - Telemetry profile JSON
/// * `output_path` - WAV file to write
/// * `config_path` - Optional configuration JSON; the preset is used otherwise
/// * `preset` - Built-in preset
/// * `trace` - Print the per-buffer parameter trace
pub fn run(
    profile_path: &str,
    output_path: &str,
    config_path: Option<&str>,
    preset: Preset,
    trace: bool,
) -> Result<ExitCode> {
    let start = Instant::now();
    let config = load_config(config_path, preset)?;
    let profile = load_profile(profile_path)?;

    println!("{} {}", "Rendering:".cyan().bold(), profile_path);

    let mut sink = WavSink::create(output_path, config.pipeline.sample_rate)
        .with_context(|| format!("Failed to create WAV file: {}", output_path))?;
    let report = render_into(&config, &profile, &mut sink)?;

    if trace {
        print_trace(&report.trace);
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    println!(
        "{} {} samples at {} Hz ({} sounding, {} silent buffers)",
        "Wrote".dimmed(),
        report.samples,
        report.sample_rate,
        report.enabled_buffers,
        report.silent_buffers
    );
    println!(
        "\n{} {} ({}ms)",
        "SUCCESS".green().bold(),
        output_path,
        duration_ms
    );
    Ok(ExitCode::SUCCESS)
}

fn print_trace(trace: &[BufferTrace]) {
    println!(
        "{:>8}  {:>8}  {:<13} {:<12} {:>10}  {:>6}",
        "time s", "km/h", "rotor", "mode", "carrier Hz", "gain"
    );
    for entry in trace {
        println!(
            "{:>8.3}  {:>8.2}  {:<13} {:<12} {:>10.1}  {:>6.3}",
            entry.time_s,
            entry.speed_kmh,
            entry.rotor_state.to_string(),
            entry.waveform.to_string(),
            entry.carrier_hz,
            entry.amplitude
        );
    }
}
