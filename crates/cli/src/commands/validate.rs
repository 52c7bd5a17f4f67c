//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use contracts::{Capability, RelayConfig};
use relay::builtin_manifest;

use super::load_config;
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
    section_count: usize,
    source_count: usize,
    handler_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(config_path: &Path, args: &ValidateArgs) -> Result<()> {
    info!(config = %config_path.display(), "Validating configuration");

    let result = validate_config(config_path);

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

fn validate_config(config_path: &Path) -> ValidationResult {
    let path = config_path.display().to_string();

    match load_config(config_path) {
        Ok(config) => {
            let (summary, warnings) = summarize(&config);
            ValidationResult {
                valid: true,
                config_path: path,
                error: None,
                warnings,
                summary: Some(summary),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path: path,
            error: Some(format!("{e:#}")),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Count configured plugins and collect non-fatal findings
fn summarize(config: &RelayConfig) -> (ConfigSummary, Vec<String>) {
    let manifest = builtin_manifest();
    let mut warnings = Vec::new();
    let mut source_count = 0;
    let mut handler_count = 0;

    for declaration in manifest.declarations() {
        let Some(section) = config.section(declaration.name()) else {
            continue;
        };
        match declaration.capability() {
            Capability::Source => source_count += 1,
            Capability::Handler => {
                handler_count += 1;
                if section.reading_types().is_none() {
                    warnings.push(format!(
                        "handler '{}' has no reading_types and will receive nothing",
                        declaration.name()
                    ));
                }
            }
        }
    }

    for name in config.section_names() {
        if !manifest.contains(name) {
            warnings.push(format!("section '{name}' matches no known plugin"));
        }
    }

    (
        ConfigSummary {
            section_count: config.len(),
            source_count,
            handler_count,
        },
        warnings,
    )
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
    }

    if let Some(ref error) = result.error {
        println!("  Error: {}", error);
    }

    for warning in &result.warnings {
        println!("  Warning: {}", warning);
    }

    if let Some(ref summary) = result.summary {
        println!("  Sections: {}", summary.section_count);
        println!("  Sources:  {}", summary.source_count);
        println!("  Handlers: {}", summary.handler_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PluginConfig;

    #[test]
    fn test_summarize_warnings() {
        let config = RelayConfig::new()
            .with_section("random-source", PluginConfig::new())
            .with_section("log-handler", PluginConfig::new())
            .with_section("influxdb", PluginConfig::new());

        let (summary, warnings) = summarize(&config);

        assert_eq!(summary.section_count, 3);
        assert_eq!(summary.source_count, 1);
        assert_eq!(summary.handler_count, 1);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("log-handler")));
        assert!(warnings.iter().any(|w| w.contains("influxdb")));
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate_config(&dir.path().join("absent.toml"));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("not found"));
    }
}
