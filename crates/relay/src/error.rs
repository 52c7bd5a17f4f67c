//! Relay error types

use thiserror::Error;

use contracts::PluginError;

/// Relay-specific errors
///
/// Only faults the relay refuses to contain end up here; recoverable plugin
/// faults are logged at the call site and never surface as `RelayError`.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Plugin constructor failed
    #[error("failed to construct plugin '{plugin}': {source}")]
    PluginConstruction {
        plugin: String,
        #[source]
        source: PluginError,
    },

    /// Plugin raised a non-recoverable fault
    #[error("plugin '{plugin}' failed fatally during {operation}: {message}")]
    PluginFatal {
        plugin: String,
        operation: Operation,
        message: String,
    },

    /// Configuration error (from contract)
    #[error("config error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl RelayError {
    /// Create a plugin construction error
    pub fn plugin_construction(plugin: impl Into<String>, source: PluginError) -> Self {
        Self::PluginConstruction {
            plugin: plugin.into(),
            source,
        }
    }

    /// Create a fatal plugin error
    pub fn plugin_fatal(
        plugin: impl Into<String>,
        operation: Operation,
        error: &PluginError,
    ) -> Self {
        Self::PluginFatal {
            plugin: plugin.into(),
            operation,
            message: error.to_string(),
        }
    }
}

/// Plugin operation a fault was raised from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetReadings,
    SetReading,
    Flush,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::GetReadings => "get_readings",
            Self::SetReading => "set_reading",
            Self::Flush => "flush",
        })
    }
}
