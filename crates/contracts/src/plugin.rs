//! Plugin capabilities - Source / Handler / Flush
//!
//! Sources are asked for readings, handlers are given them. Flushing is an
//! optional second capability a handler exposes through [`Handler::as_flush`].

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{PluginError, Reading};

/// Data-producing plugin
///
/// # Example
///
/// ```ignore
/// struct Thermometer;
///
/// #[async_trait]
/// impl Source for Thermometer {
///     async fn get_readings(&mut self) -> Result<Vec<Reading>, PluginError> {
///         Ok(vec![Reading::with_value("temp", 21.5)])
///     }
/// }
/// ```
#[async_trait]
pub trait Source: Send {
    /// Poll for the readings observed since the last call
    ///
    /// An empty vector means nothing to report this cycle.
    ///
    /// # Errors
    /// Recoverable read failures are returned as [`PluginError::Operational`].
    async fn get_readings(&mut self) -> Result<Vec<Reading>, PluginError>;
}

/// Data-consuming plugin
#[async_trait]
pub trait Handler: Send {
    /// Accept one reading of a subscribed type
    async fn set_reading(&mut self, reading: &Reading) -> Result<(), PluginError>;

    /// Flush capability, if this handler buffers state
    fn as_flush(&mut self) -> Option<&mut dyn Flush> {
        None
    }
}

/// Drain buffered state at shutdown
#[async_trait]
pub trait Flush: Send {
    async fn flush(&mut self) -> Result<(), PluginError>;
}

/// Declared plugin capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Source,
    Handler,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Handler => "handler",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "source" => Ok(Self::Source),
            "handler" => Ok(Self::Handler),
            other => Err(format!("unknown plugin capability: {other}")),
        }
    }
}
