//! # Contracts
//!
//! Frozen interface contracts shared by every relay crate.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data Model
//! - [`Reading`] is the single datum that flows from sources to handlers
//! - [`Source`] / [`Handler`] / [`Flush`] are the plugin capabilities
//! - [`RelayConfig`] holds one [`PluginConfig`] section per plugin identity

mod config;
mod error;
mod plugin;
mod reading;

pub use config::{PluginConfig, RelayConfig, READING_TYPES_ALIAS, READING_TYPES_KEY};
pub use error::*;
pub use plugin::{Capability, Flush, Handler, Source};
pub use reading::{Reading, ReadingValue};
