//! FileHandler - buffers readings and appends them to disk as JSON lines

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use contracts::{Flush, Handler, PluginConfig, PluginError, Reading};

/// Readings buffered before an automatic write
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Configuration for FileHandler
#[derive(Debug, Clone)]
pub struct FileHandlerConfig {
    /// Output file, created if missing
    pub path: PathBuf,
    /// Buffered readings that trigger a write
    pub buffer_size: usize,
}

impl FileHandlerConfig {
    /// Create config from a plugin section
    ///
    /// `path` is required, `buffer_size` defaults to [`DEFAULT_BUFFER_SIZE`].
    pub fn from_config(config: &PluginConfig) -> Result<Self, PluginError> {
        let path = config
            .get("path")
            .map(PathBuf::from)
            .ok_or_else(|| PluginError::config("path", "missing required option"))?;

        let buffer_size = config
            .get_parsed::<usize>("buffer_size")
            .map_err(|e| PluginError::config("buffer_size", e.to_string()))?
            .unwrap_or(DEFAULT_BUFFER_SIZE)
            .max(1);

        Ok(Self { path, buffer_size })
    }
}

/// Handler that appends readings to a JSON lines file
///
/// Readings are kept in memory until `buffer_size` accumulate or the relay
/// flushes at shutdown.
pub struct FileHandler {
    config: FileHandlerConfig,
    buffer: Vec<Reading>,
}

impl FileHandler {
    /// Create a new FileHandler
    ///
    /// Creates the parent directory of the output file if needed.
    pub fn new(config: FileHandlerConfig) -> Result<Self, PluginError> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                PluginError::with_source(format!("cannot create {}", parent.display()), e)
            })?;
        }

        Ok(Self {
            buffer: Vec::with_capacity(config.buffer_size),
            config,
        })
    }

    /// Create from a plugin section (for the manifest)
    pub fn from_config(config: &PluginConfig) -> Result<Self, PluginError> {
        Self::new(FileHandlerConfig::from_config(config)?)
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append every buffered reading in one write
    ///
    /// The buffer is only cleared once the write succeeded.
    fn write_buffered(&mut self) -> Result<(), PluginError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut lines = String::new();
        for reading in &self.buffer {
            let line = serde_json::to_string(reading).map_err(|e| {
                PluginError::with_source(format!("cannot encode {}", reading.series_key()), e)
            })?;
            lines.push_str(&line);
            lines.push('\n');
        }

        let path = &self.config.path;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(lines.as_bytes()))
            .map_err(|e| PluginError::with_source(format!("cannot write {}", path.display()), e))?;

        debug!(
            path = %path.display(),
            readings = self.buffer.len(),
            "Readings written"
        );
        self.buffer.clear();
        Ok(())
    }
}

#[async_trait]
impl Handler for FileHandler {
    async fn set_reading(&mut self, reading: &Reading) -> Result<(), PluginError> {
        self.buffer.push(reading.clone());
        if self.buffer.len() >= self.config.buffer_size {
            self.write_buffered()?;
        }
        Ok(())
    }

    fn as_flush(&mut self) -> Option<&mut dyn Flush> {
        Some(self)
    }
}

#[async_trait]
impl Flush for FileHandler {
    async fn flush(&mut self) -> Result<(), PluginError> {
        self.write_buffered()
    }
}
