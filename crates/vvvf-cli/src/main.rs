//! vvvf CLI - Command-line interface for the VVVF inverter sound engine
//!
//! This binary validates inverter configurations, renders telemetry
//! profiles to WAV files, and drives the real-time engine.

mod cli_args;

use clap::Parser;
use std::process::ExitCode;

use cli_args::{Cli, Commands};
use vvvf_cli::commands;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate { config, json } => commands::validate::run(&config, json),
        Commands::ShowConfig {
            config,
            preset,
            json,
        } => commands::show_config::run(config.as_deref(), preset, json),
        Commands::Render {
            profile,
            output,
            config,
            preset,
            trace,
        } => commands::render::run(&profile, &output, config.as_deref(), preset, trace),
        Commands::Run {
            profile,
            output,
            config,
            preset,
            stats_interval_ms,
        } => commands::run::run(
            &profile,
            output.as_deref(),
            config.as_deref(),
            preset,
            stats_interval_ms,
        ),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
