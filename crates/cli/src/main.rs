//! # IoT Relay CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 中继生命周期管理
//! - 优雅关闭处理 (SIGINT / SIGTERM)

mod cli;
mod commands;
mod error;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands, RunArgs};
use commands::{run_plugins, run_relay, run_validate};
use observability::ObservabilityConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: cli.log_level.as_filter().to_string(),
    })
    .context("Failed to initialize logging")?;

    info!(version = env!("CARGO_PKG_VERSION"), "IoT Relay starting");

    let result = execute(&cli).await;

    if let Err(ref e) = result {
        tracing::error!(severity = "critical", error = %format!("{e:#}"), "Command failed");
    }

    result
}

async fn execute(cli: &Cli) -> Result<()> {
    let config_path = cli.config_path()?;

    match &cli.command {
        Some(Commands::Run(args)) => run_relay(&config_path, args).await,
        None => run_relay(&config_path, &RunArgs::from_env()?).await,
        Some(Commands::Validate(args)) => run_validate(&config_path, args),
        Some(Commands::Plugins(args)) => run_plugins(&config_path, args),
    }
}
