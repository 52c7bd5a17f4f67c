//! Relay - the poll and fan-out loop

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument, warn};

use contracts::{PluginError, Reading};

use crate::error::{Operation, RelayError};
use crate::metrics::{RelayMetrics, RelayStats};
use crate::registry::{PluginRegistry, RegisteredHandler, RegisteredSource};
use crate::shutdown::ShutdownHandle;

/// Default wait between two cycles
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Relay loop options
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Upper bound of the wait between cycles
    pub poll_interval: Duration,
    /// Stop after this many cycles (None = until signalled)
    pub max_cycles: Option<u64>,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_cycles: None,
        }
    }
}

/// Lifecycle of a relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Running,
    /// Stop requested, loop exiting or handlers not yet flushed
    Stopping,
    Stopped,
}

/// Outcome of a single cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub sources_polled: usize,
    pub source_failures: usize,
    pub readings: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
    /// Readings with no subscribed handler
    pub unrouted: usize,
    /// Readings dropped for carrying no value
    pub null_values: usize,
}

/// The relay: polls sources and hands readings to subscribed handlers
///
/// Everything runs on one task. Sources are polled in registration order
/// and each reading is delivered to its handlers in subscription order.
pub struct Relay {
    registry: PluginRegistry,
    options: RelayOptions,
    shutdown: ShutdownHandle,
    metrics: Arc<RelayMetrics>,
    flushed: bool,
}

impl Relay {
    /// Create a relay over an instantiated registry
    pub fn new(registry: PluginRegistry, options: RelayOptions) -> Self {
        observability::record_registered_plugins(
            registry.source_count(),
            registry.handler_count(),
        );
        Self {
            registry,
            options,
            shutdown: ShutdownHandle::new(),
            metrics: Arc::new(RelayMetrics::new()),
            flushed: false,
        }
    }

    /// Use an existing stop flag
    pub fn with_shutdown(mut self, shutdown: ShutdownHandle) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Handle that stops this relay when triggered
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn metrics(&self) -> &Arc<RelayMetrics> {
        &self.metrics
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn state(&self) -> RelayState {
        if self.flushed {
            RelayState::Stopped
        } else if self.shutdown.is_triggered() {
            RelayState::Stopping
        } else {
            RelayState::Running
        }
    }

    /// Run cycles until stopped, then flush every handler
    pub async fn run_until_stopped(&mut self) -> Result<RelayStats, RelayError> {
        self.run().await?;
        self.flush_handlers().await?;
        Ok(self.metrics.snapshot())
    }

    /// Run cycles until the stop flag is set or the cycle limit is reached
    ///
    /// Between cycles the relay waits up to `poll_interval`, returning early
    /// when the stop flag is set.
    ///
    /// # Errors
    /// Fatal plugin faults end the loop and are returned.
    #[instrument(
        name = "relay_run",
        skip(self),
        fields(
            sources = self.registry.source_count(),
            handlers = self.registry.handler_count()
        )
    )]
    pub async fn run(&mut self) -> Result<(), RelayError> {
        info!(
            poll_interval_ms = self.options.poll_interval.as_millis() as u64,
            "Relay started"
        );

        let mut cycles: u64 = 0;

        while !self.shutdown.is_triggered() {
            self.run_cycle().await?;
            cycles += 1;

            if self.options.max_cycles.is_some_and(|max| cycles >= max) {
                info!(cycles, "Cycle limit reached");
                self.shutdown.trigger();
                break;
            }

            tokio::select! {
                biased;
                _ = self.shutdown.triggered() => break,
                _ = tokio::time::sleep(self.options.poll_interval) => {}
            }
        }

        info!(cycles, "Relay loop stopped");
        Ok(())
    }

    /// Poll every source once and deliver what they produce
    ///
    /// # Errors
    /// Only fatal plugin faults; recoverable ones are logged and counted.
    #[instrument(name = "relay_cycle", skip(self))]
    pub async fn run_cycle(&mut self) -> Result<CycleReport, RelayError> {
        let started = Instant::now();
        let mut report = CycleReport::default();

        let PluginRegistry {
            sources,
            handlers,
            subscriptions,
        } = &mut self.registry;

        for source in sources.iter_mut() {
            report.sources_polled += 1;

            let Some(readings) = poll_source(source, &mut report).await? else {
                continue;
            };

            for reading in readings {
                report.readings += 1;

                let subscribers = match subscriptions.get(reading.reading_type()) {
                    Some(ids) if !ids.is_empty() => ids,
                    _ => {
                        report.unrouted += 1;
                        observability::record_reading_dropped(reading.reading_type(), "unrouted");
                        continue;
                    }
                };

                if reading.value().is_none() {
                    warn!(
                        series_key = %reading.series_key(),
                        "None value from {}",
                        reading.series_key()
                    );
                    report.null_values += 1;
                    observability::record_reading_dropped(reading.reading_type(), "null_value");
                    continue;
                }

                for id in subscribers {
                    let handler = &mut handlers[id.0];
                    deliver(handler, &reading, &mut report).await?;
                }
            }
        }

        self.metrics.record_cycle(&report);
        observability::record_cycle(started.elapsed().as_secs_f64() * 1000.0);

        debug!(
            sources = report.sources_polled,
            readings = report.readings,
            delivered = report.delivered,
            "Cycle complete"
        );

        Ok(report)
    }

    /// Flush every distinct handler once
    ///
    /// Handlers without the flush capability are skipped. A recoverable
    /// flush fault is logged and the remaining handlers are still flushed.
    /// Calling this again after it ran is a no-op.
    ///
    /// Returns the number of handlers flushed successfully.
    #[instrument(name = "relay_flush_handlers", skip(self))]
    pub async fn flush_handlers(&mut self) -> Result<usize, RelayError> {
        if self.flushed {
            debug!("Handlers already flushed");
            return Ok(0);
        }
        self.flushed = true;

        let mut flushed = 0;

        for handler in self.registry.handlers.iter_mut() {
            let Some(flush) = handler.plugin.as_flush() else {
                debug!(handler = %handler.name, "Handler has no flush capability, skipping");
                continue;
            };

            match flush.flush().await {
                Ok(()) => {
                    flushed += 1;
                    self.metrics.inc_flushed();
                    observability::record_handler_flushed(&handler.name, true);
                    debug!(handler = %handler.name, "Handler flushed");
                }
                Err(e) if e.is_recoverable() => {
                    observability::record_handler_flushed(&handler.name, false);
                    error!(handler = %handler.name, error = %e, "Handler flush failed");
                }
                Err(e) => {
                    return Err(RelayError::plugin_fatal(&handler.name, Operation::Flush, &e));
                }
            }
        }

        info!(flushed, "Handlers flushed");
        Ok(flushed)
    }
}

/// Poll one source, containing recoverable faults
///
/// `Ok(None)` means the source failed this cycle and was skipped.
async fn poll_source(
    source: &mut RegisteredSource,
    report: &mut CycleReport,
) -> Result<Option<Vec<Reading>>, RelayError> {
    match source.plugin.get_readings().await {
        Ok(readings) => {
            observability::record_source_polled(&source.name, true, readings.len());
            Ok(Some(readings))
        }
        Err(e) => {
            observability::record_source_polled(&source.name, false, 0);
            contain(&source.name, Operation::GetReadings, e)?;
            report.source_failures += 1;
            Ok(None)
        }
    }
}

async fn deliver(
    handler: &mut RegisteredHandler,
    reading: &Reading,
    report: &mut CycleReport,
) -> Result<(), RelayError> {
    let result = handler.plugin.set_reading(reading).await;
    observability::record_reading_delivered(&handler.name, reading.reading_type(), result.is_ok());

    match result {
        Ok(()) => report.delivered += 1,
        Err(e) => {
            contain(&handler.name, Operation::SetReading, e)?;
            report.delivery_failures += 1;
        }
    }
    Ok(())
}

/// Log a recoverable plugin fault, or escalate a fatal one
fn contain(plugin: &str, operation: Operation, error: PluginError) -> Result<(), RelayError> {
    if !error.is_recoverable() {
        return Err(RelayError::plugin_fatal(plugin, operation, &error));
    }
    match operation {
        Operation::GetReadings => {
            error!(source = %plugin, operation = %operation, error = %error, "Source failed")
        }
        _ => error!(handler = %plugin, operation = %operation, error = %error, "Handler failed"),
    }
    Ok(())
}
