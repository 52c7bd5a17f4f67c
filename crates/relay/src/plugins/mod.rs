//! Built-in plugins
//!
//! Contains RandomSource, LogHandler, and FileHandler.

mod file;
mod log;
mod random;

pub use self::file::FileHandler;
pub use self::log::LogHandler;
pub use self::random::RandomSource;

use contracts::{Handler, Source};

use crate::registry::PluginManifest;

pub const RANDOM_SOURCE: &str = "random-source";
pub const LOG_HANDLER: &str = "log-handler";
pub const FILE_HANDLER: &str = "file-handler";

/// Manifest declaring every built-in plugin
///
/// Sources first, then handlers, in the order listed here.
pub fn builtin_manifest() -> PluginManifest {
    PluginManifest::new()
        .with_source(RANDOM_SOURCE, |config| {
            Ok(Box::new(RandomSource::from_config(config)?) as Box<dyn Source>)
        })
        .with_handler(LOG_HANDLER, |_| {
            Ok(Box::new(LogHandler::new(LOG_HANDLER)) as Box<dyn Handler>)
        })
        .with_handler(FILE_HANDLER, |config| {
            Ok(Box::new(FileHandler::from_config(config)?) as Box<dyn Handler>)
        })
}
