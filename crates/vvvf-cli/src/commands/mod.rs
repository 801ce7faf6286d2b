//! CLI command implementations

pub mod render;
pub mod run;
pub mod show_config;
pub mod validate;

use anyhow::{Context, Result};
use clap::ValueEnum;
use vvvf_backend_audio::TelemetryProfile;
use vvvf_spec::InverterConfig;

/// Built-in configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Single fixed-carrier range up to 31 km/h
    Default,
    /// Multi-range railway pattern up to 150 km/h
    Traction,
}

impl Preset {
    /// Builds the preset's configuration.
    pub fn config(self) -> InverterConfig {
        match self {
            Preset::Default => InverterConfig::default(),
            Preset::Traction => InverterConfig::traction_preset(),
        }
    }
}

/// Loads the configuration file if one is given, otherwise the preset.
pub fn load_config(path: Option<&str>, preset: Preset) -> Result<InverterConfig> {
    match path {
        Some(path) => InverterConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration: {}", path)),
        None => Ok(preset.config()),
    }
}

/// Loads a telemetry profile.
pub fn load_profile(path: &str) -> Result<TelemetryProfile> {
    TelemetryProfile::from_file(path)
        .with_context(|| format!("Failed to load telemetry profile: {}", path))
}
