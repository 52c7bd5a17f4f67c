//! LogHandler - logs each reading via tracing

use async_trait::async_trait;
use contracts::{Handler, PluginError, Reading};
use tracing::info;

/// Handler that logs readings for debugging
///
/// Holds no state, so it exposes no flush capability.
pub struct LogHandler {
    name: String,
}

impl LogHandler {
    /// Create a new LogHandler with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Handler for LogHandler {
    async fn set_reading(&mut self, reading: &Reading) -> Result<(), PluginError> {
        info!(
            handler = %self.name,
            reading_type = %reading.reading_type(),
            tags = reading.tags().len(),
            "{reading}"
        );
        Ok(())
    }
}
