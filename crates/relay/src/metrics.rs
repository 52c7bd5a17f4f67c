//! Relay counters for run summaries

use std::sync::atomic::{AtomicU64, Ordering};

use crate::relay::CycleReport;

/// Cumulative counters of a relay run
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Completed cycles
    cycles: AtomicU64,
    /// Readings produced by sources
    readings: AtomicU64,
    /// Successful handler deliveries
    delivered: AtomicU64,
    /// Failed handler deliveries
    delivery_failures: AtomicU64,
    /// Failed source polls
    source_failures: AtomicU64,
    /// Readings dropped for carrying no value
    null_values: AtomicU64,
    /// Readings no handler subscribed to
    unrouted: AtomicU64,
    /// Handlers flushed at shutdown
    flushed: AtomicU64,
}

impl RelayMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one cycle into the totals
    pub fn record_cycle(&self, report: &CycleReport) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.readings
            .fetch_add(report.readings as u64, Ordering::Relaxed);
        self.delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.delivery_failures
            .fetch_add(report.delivery_failures as u64, Ordering::Relaxed);
        self.source_failures
            .fetch_add(report.source_failures as u64, Ordering::Relaxed);
        self.null_values
            .fetch_add(report.null_values as u64, Ordering::Relaxed);
        self.unrouted
            .fetch_add(report.unrouted as u64, Ordering::Relaxed);
    }

    /// Increment flushed handler count
    pub fn inc_flushed(&self) {
        self.flushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> RelayStats {
        RelayStats {
            cycles: self.cycles(),
            readings: self.readings.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
            null_values: self.null_values.load(Ordering::Relaxed),
            unrouted: self.unrouted.load(Ordering::Relaxed),
            flushed: self.flushed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of relay counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub cycles: u64,
    pub readings: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
    pub source_failures: u64,
    pub null_values: u64,
    pub unrouted: u64,
    pub flushed: u64,
}
