//! # Relay
//!
//! 数据中继引擎。
//!
//! 负责：
//! - 按配置解析并实例化已声明的插件
//! - 每个周期轮询 sources，按 reading type 分发到 handlers
//! - 隔离可恢复的插件故障
//! - 收到信号后停止，并对每个 handler 执行一次 flush

pub mod error;
pub mod metrics;
pub mod plugins;
pub mod registry;
pub mod relay;
pub mod shutdown;

#[cfg(test)]
mod testing;

pub use contracts::{Flush, Handler, PluginConfig, PluginError, Reading, ReadingValue, Source};
pub use error::{Operation, RelayError};
pub use metrics::{RelayMetrics, RelayStats};
pub use plugins::{builtin_manifest, FileHandler, LogHandler, RandomSource};
pub use registry::{HandlerId, PluginDeclaration, PluginManifest, PluginRegistry};
pub use relay::{CycleReport, Relay, RelayOptions, RelayState, DEFAULT_POLL_INTERVAL};
pub use shutdown::{listen_for_signals, ShutdownHandle};
