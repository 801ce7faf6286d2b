//! Validate command implementation
//!
//! Loads a configuration file and reports every validation problem.

use anyhow::{Context, Result};
use colored::Colorize;
use std::process::ExitCode;
use vvvf_spec::{validate_config, InverterConfig};

/// Run the validate command
///
/// # Arguments
/// * `config_path` - Path to the configuration JSON
/// * `json_output` - Whether to output machine-readable JSON diagnostics
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(config_path: &str, json_output: bool) -> Result<ExitCode> {
    let json = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read configuration: {}", config_path))?;

    // Parse without validating so every problem can be listed.
    let parsed: Result<InverterConfig, _> = serde_json::from_str(&json);
    let errors: Vec<(String, String)> = match &parsed {
        Ok(config) => validate_config(config)
            .into_iter()
            .map(|e| (e.code().to_string(), e.to_string()))
            .collect(),
        Err(e) => vec![("PARSE".to_string(), e.to_string())],
    };

    if json_output {
        let output = serde_json::json!({
            "path": config_path,
            "ok": errors.is_empty(),
            "ranges": parsed.as_ref().map(|c| c.ranges.len()).unwrap_or(0),
            "errors": errors
                .iter()
                .map(|(code, message)| serde_json::json!({"code": code, "message": message}))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} {}", "Validating:".cyan().bold(), config_path);
        for (code, message) in &errors {
            println!("  {} [{}] {}", "x".red(), code.dimmed(), message);
        }
        if errors.is_empty() {
            let ranges = parsed.as_ref().map(|c| c.ranges.len()).unwrap_or(0);
            println!(
                "\n{} Configuration is valid ({} speed ranges)",
                "SUCCESS".green().bold(),
                ranges
            );
        } else {
            println!(
                "\n{} Configuration has {} error(s)",
                "FAILED".red().bold(),
                errors.len()
            );
        }
    }

    Ok(if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
