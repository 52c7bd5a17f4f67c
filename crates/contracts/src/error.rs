//! Layered error definitions
//!
//! Categorized by origin: configuration / plugin operation

use thiserror::Error;

/// Boxed error used as a `#[source]` payload
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ContractError {
    /// Configuration file does not exist
    #[error("config file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Fault raised by a plugin
///
/// `Operational` and `Config` are the designated recoverable kinds: the relay
/// loop logs them and moves on. `Fatal` is never contained.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Recoverable read/delivery/flush failure
    #[error("{message}")]
    Operational {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Invalid or missing plugin option
    #[error("invalid option '{key}': {message}")]
    Config { key: String, message: String },

    /// Unrecoverable failure, terminates the relay
    #[error("fatal: {message}")]
    Fatal { message: String },
}

impl PluginError {
    /// Create a recoverable operational error
    pub fn operational(message: impl Into<String>) -> Self {
        Self::Operational {
            message: message.into(),
            source: None,
        }
    }

    /// Create a recoverable operational error wrapping an underlying cause
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Operational {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an option error
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a fatal error
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    /// Whether the relay loop may contain this fault and keep running
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Fatal { .. })
    }
}
