//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::error::CliError;

/// Config file looked up in the home directory when `--config-file` is absent
pub const DEFAULT_CONFIG_NAME: &str = ".iotrelay.toml";

/// IoT Relay - relay data between data sources and destinations
#[derive(Parser, Debug)]
#[command(
    name = "iotrelay",
    author,
    version,
    about = "Internet of Things Relay",
    long_about = "Polls configured source plugins for readings and relays each reading\n\
                  to the handler plugins subscribed to its type."
)]
pub struct Cli {
    /// Configuration file (TOML or JSON), defaults to ~/.iotrelay.toml
    #[arg(short = 'c', long, global = true, env = "IOTRELAY_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(
        long,
        value_enum,
        default_value = "info",
        global = true,
        env = "IOTRELAY_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "IOTRELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Command to run, `run` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Config file to load
    pub fn config_path(&self) -> Result<PathBuf, CliError> {
        if let Some(path) = &self.config_file {
            return Ok(path.clone());
        }
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(DEFAULT_CONFIG_NAME))
            .ok_or(CliError::NoHomeDirectory)
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay until interrupted
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// List available plugins and their configuration state
    Plugins(PluginsArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Maximum wait between two polling cycles, in milliseconds
    #[arg(
        long,
        default_value = "1000",
        env = "IOTRELAY_POLL_INTERVAL_MS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// Stop after this many cycles (0 = unlimited)
    #[arg(long, default_value = "0", env = "IOTRELAY_MAX_CYCLES")]
    pub max_cycles: u64,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "IOTRELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

impl RunArgs {
    /// `run` arguments when no command is given: defaults plus env overrides
    pub fn from_env() -> Result<Self, clap::Error> {
        Self::try_parse_from(["run"])
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `plugins` command
#[derive(Parser, Debug)]
pub struct PluginsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log level
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["iotrelay", "-c", "relay.toml"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.config_path().unwrap(), PathBuf::from("relay.toml"));
    }

    #[test]
    fn test_run_args() {
        let cli = Cli::try_parse_from([
            "iotrelay",
            "run",
            "--poll-interval-ms",
            "250",
            "--max-cycles",
            "3",
            "--log-level",
            "warning",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_filter(), "warn");
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.poll_interval_ms, 250);
                assert_eq!(args.max_cycles, 3);
                assert_eq!(args.metrics_port, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        assert!(Cli::try_parse_from(["iotrelay", "run", "--poll-interval-ms", "0"]).is_err());
    }

    #[test]
    fn test_default_run_args_read_env() {
        std::env::set_var("IOTRELAY_MAX_CYCLES", "7");
        let args = RunArgs::from_env();
        std::env::remove_var("IOTRELAY_MAX_CYCLES");

        let args = args.unwrap();
        assert_eq!(args.max_cycles, 7);
        assert_eq!(args.poll_interval_ms, 1000);
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["iotrelay", "--log-level", "verbose"]).is_err());
    }
}
