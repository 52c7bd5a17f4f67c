//! `plugins` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::warn;

use contracts::{Capability, RelayConfig};
use relay::builtin_manifest;

use super::load_config;
use crate::cli::PluginsArgs;

/// Plugin info for JSON output
#[derive(Serialize)]
struct PluginInfo {
    name: String,
    capability: Capability,
    configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reading_types: Option<Vec<String>>,
}

/// Execute the `plugins` command
///
/// Lists plugins without instantiating them. A missing config file is
/// reported but not fatal here.
pub fn run_plugins(config_path: &Path, args: &PluginsArgs) -> Result<()> {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Listing plugins without configuration");
            RelayConfig::new()
        }
    };

    let plugins = collect_plugins(&config);

    if args.json {
        let json =
            serde_json::to_string_pretty(&plugins).context("Failed to serialize plugin list")?;
        println!("{}", json);
    } else {
        print_plugins(&plugins);
    }

    Ok(())
}

fn collect_plugins(config: &RelayConfig) -> Vec<PluginInfo> {
    builtin_manifest()
        .declarations()
        .iter()
        .map(|declaration| {
            let section = config.section(declaration.name());
            let reading_types = match declaration.capability() {
                Capability::Handler => section.and_then(|s| s.reading_types()),
                Capability::Source => None,
            };
            PluginInfo {
                name: declaration.name().to_string(),
                capability: declaration.capability(),
                configured: section.is_some(),
                reading_types,
            }
        })
        .collect()
}

fn print_plugins(plugins: &[PluginInfo]) {
    println!("\n=== Plugins ({}) ===\n", plugins.len());
    for plugin in plugins {
        let state = if plugin.configured {
            "configured"
        } else {
            "not configured"
        };
        print!("  - {} ({}) - {}", plugin.name, plugin.capability, state);
        if let Some(ref types) = plugin.reading_types {
            print!(" - reading types: {}", types.join(", "));
        }
        println!();
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PluginConfig;

    #[test]
    fn test_collect_plugins() {
        let config = RelayConfig::new().with_section(
            "log-handler",
            [("reading_types", "random, temp")].into_iter().collect::<PluginConfig>(),
        );

        let plugins = collect_plugins(&config);
        let log = plugins.iter().find(|p| p.name == "log-handler").unwrap();
        assert!(log.configured);
        assert_eq!(
            log.reading_types.as_deref(),
            Some(&["random".to_string(), "temp".to_string()][..])
        );

        let random = plugins.iter().find(|p| p.name == "random-source").unwrap();
        assert!(!random.configured);
        assert_eq!(random.capability, Capability::Source);
    }
}
