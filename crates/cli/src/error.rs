//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// No home directory to look for the default configuration in
    #[error("Cannot locate home directory for the default configuration, pass --config-file")]
    NoHomeDirectory,

    /// Signal handler installation failed
    #[error("Failed to install signal handlers: {message}")]
    SignalHandler { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn signal_handler(message: impl Into<String>) -> Self {
        Self::SignalHandler {
            message: message.into(),
        }
    }
}
