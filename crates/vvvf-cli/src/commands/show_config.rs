//! Show-config command implementation

use anyhow::Result;
use std::process::ExitCode;

use super::{load_config, Preset};

/// Run the show-config command
///
/// # Arguments
/// * `config_path` - Optional configuration JSON; the preset is used otherwise
/// * `preset` - Built-in preset
/// * `json_output` - Print JSON instead of the human-readable table
pub fn run(config_path: Option<&str>, preset: Preset, json_output: bool) -> Result<ExitCode> {
    let config = load_config(config_path, preset)?;
    if json_output {
        println!("{}", config.to_json_pretty()?);
    } else {
        print!("{}", config);
    }
    Ok(ExitCode::SUCCESS)
}
