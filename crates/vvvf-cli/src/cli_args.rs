//! CLI argument definitions for the `vvvf` command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use clap::{Parser, Subcommand};
use vvvf_cli::commands::Preset;

/// vvvf - Synthetic traction inverter sound
#[derive(Parser)]
#[command(name = "vvvf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Validate an inverter configuration file
    Validate {
        /// Path to the configuration JSON
        config: String,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print a configuration (a file or a built-in preset)
    ShowConfig {
        /// Path to a configuration JSON (overrides --preset)
        #[arg(short, long)]
        config: Option<String>,

        /// Built-in preset to use when no file is given
        #[arg(short, long, value_enum, default_value_t = Preset::Default)]
        preset: Preset,

        /// Print as JSON instead of the human-readable table
        #[arg(long)]
        json: bool,
    },

    /// Render a telemetry profile to an 8-bit WAV file offline
    Render {
        /// Path to the telemetry profile JSON
        #[arg(long)]
        profile: String,

        /// Output WAV path
        #[arg(short, long)]
        output: String,

        /// Path to a configuration JSON (overrides --preset)
        #[arg(short, long)]
        config: Option<String>,

        /// Built-in preset to use when no file is given
        #[arg(short, long, value_enum, default_value_t = Preset::Default)]
        preset: Preset,

        /// Print the per-buffer parameter trace
        #[arg(long)]
        trace: bool,
    },

    /// Run the real-time engine, replaying a telemetry profile at wall-clock speed
    Run {
        /// Path to the telemetry profile JSON
        #[arg(long)]
        profile: String,

        /// Write played buffers to this WAV file (default: discard)
        #[arg(short, long)]
        output: Option<String>,

        /// Path to a configuration JSON (overrides --preset)
        #[arg(short, long)]
        config: Option<String>,

        /// Built-in preset to use when no file is given
        #[arg(short, long, value_enum, default_value_t = Preset::Default)]
        preset: Preset,

        /// Interval between statistics printouts in milliseconds (0 disables)
        #[arg(long, default_value_t = 1000)]
        stats_interval_ms: u64,
    },
}
