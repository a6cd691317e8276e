//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::PacerConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    setup_delay_ms: u64,
    cycles: u32,
    runs: Vec<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: Vec::new(),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&config),
            summary: Some(ConfigSummary {
                version: format!("{:?}", config.version),
                setup_delay_ms: config.scene.setup_delay_ms,
                cycles: config.pacing.cycles,
                runs: config.runs.iter().map(ToString::to_string).collect(),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &PacerConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    // Early setup only pays off when transmission overlaps the setup delay
    if config.camera.transmission_ms == 0 {
        warnings.push(
            "camera.transmission_ms is 0 - exposure-end pacing cannot gain over frame-delivered"
                .to_string(),
        );
    }

    if config.pacing.image_timeout_ms.is_none() {
        warnings.push(
            "pacing.image_timeout_ms is unset - a lost frame will stall the loop".to_string(),
        );
    }

    let mut seen = Vec::new();
    for mode in &config.runs {
        if seen.contains(mode) {
            warnings.push(format!("runs lists '{mode}' more than once"));
        } else {
            seen.push(*mode);
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Setup delay: {} ms", summary.setup_delay_ms);
            println!("  Cycles per run: {}", summary.cycles);
            println!("  Runs: {}", summary.runs.join(", "));
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
