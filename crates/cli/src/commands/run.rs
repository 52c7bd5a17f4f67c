//! `run` command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use relay::{builtin_manifest, listen_for_signals, PluginRegistry, Relay, RelayOptions, RelayStats};

use super::load_config;
use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_relay(config_path: &Path, args: &RunArgs) -> Result<()> {
    info!(config = %config_path.display(), "Loading configuration");

    let config = load_config(config_path)?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let registry = PluginRegistry::load(&builtin_manifest(), &config)
        .context("Failed to load plugins")?;

    info!(
        sources = registry.source_count(),
        handlers = registry.handler_count(),
        "Plugins loaded"
    );
    if registry.source_count() == 0 {
        warn!("No source configured, the relay will idle until stopped");
    }

    let options = RelayOptions {
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        max_cycles: (args.max_cycles != 0).then_some(args.max_cycles),
    };
    let mut relay = Relay::new(registry, options);

    let listener = listen_for_signals(relay.shutdown_handle())
        .map_err(|e| CliError::signal_handler(e.to_string()))?;

    let started = Instant::now();
    let stats = relay
        .run_until_stopped()
        .await
        .context("Relay execution failed")?;

    if let Err(e) = listener.await {
        warn!(error = %e, "Signal listener ended abnormally");
    }

    info!(
        cycles = stats.cycles,
        delivered = stats.delivered,
        duration_secs = started.elapsed().as_secs_f64(),
        "Relay finished"
    );
    print_summary(&stats, started.elapsed());

    Ok(())
}

/// Print run statistics
fn print_summary(stats: &RelayStats, duration: Duration) {
    println!("\n=== Relay Summary ===\n");
    println!("  Duration:           {:.2}s", duration.as_secs_f64());
    println!("  Cycles:             {}", stats.cycles);
    println!("  Readings:           {}", stats.readings);
    println!("  Delivered:          {}", stats.delivered);
    println!("  Delivery failures:  {}", stats.delivery_failures);
    println!("  Source failures:    {}", stats.source_failures);
    println!("  Null values:        {}", stats.null_values);
    println!("  Unrouted:           {}", stats.unrouted);
    println!("  Handlers flushed:   {}", stats.flushed);
    println!();
}
