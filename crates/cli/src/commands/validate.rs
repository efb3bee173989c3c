//! `validate` command implementation.

use anyhow::{Context, Result};
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
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    period_ms: u32,
    rgb_resolution: String,
    depth_resolution: String,
    verbose: bool,
    device_wait_timeout_ms: Option<u64>,
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

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    period_ms: config.period,
                    rgb_resolution: format!(
                        "{}x{}",
                        config.rgb_resolution[0], config.rgb_resolution[1]
                    ),
                    depth_resolution: format!(
                        "{}x{}",
                        config.depth_resolution[0], config.depth_resolution[1]
                    ),
                    verbose: config.verbose,
                    device_wait_timeout_ms: config.device_wait_timeout_ms,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &contracts::DriverConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    // An absent bound reproduces the historical indefinite wait
    if config.device_wait_timeout_ms.is_none() {
        warnings.push(
            "device_wait_timeout_ms not set - open will block indefinitely if no camera is connected"
                .to_string(),
        );
    }

    if config.period < 10 {
        warnings.push(format!(
            "period of {}ms is shorter than the camera can sustain",
            config.period
        ));
    }

    if !config.registered {
        warnings.push("registered=false - depth-to-color registration display disabled (debug flag)".to_string());
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_for(path: &std::path::Path) -> ValidateArgs {
        ValidateArgs {
            config: path.to_path_buf(),
            json: false,
        }
    }

    #[test]
    fn test_validate_missing_file() {
        let args = args_for(std::path::Path::new("/nonexistent/config.toml"));
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_validate_good_config_with_warnings() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "period = 33\nrgb_resolution = [1280, 720]").unwrap();

        let result = validate_config(&args_for(file.path()));
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("device_wait_timeout_ms")));
        assert_eq!(result.summary.unwrap().rgb_resolution, "1280x720");
    }

    #[test]
    fn test_validate_bad_config() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "clip_planes = [9.0, 1.0]").unwrap();

        let result = validate_config(&args_for(file.path()));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("clip_planes"));
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Period: {}ms", summary.period_ms);
            println!("  Color: {}", summary.rgb_resolution);
            println!("  Depth: {}", summary.depth_resolution);
            println!("  Verbose: {}", summary.verbose);
            match summary.device_wait_timeout_ms {
                Some(ms) => println!("  Device wait bound: {}ms", ms),
                None => println!("  Device wait bound: none"),
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
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
