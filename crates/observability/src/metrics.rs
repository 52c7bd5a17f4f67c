//! Relay metric recording
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! every call is a no-op.

use metrics::{counter, gauge, histogram};

/// Record a completed relay cycle
pub fn record_cycle(duration_ms: f64) {
    counter!("iotrelay_cycles_total").increment(1);
    histogram!("iotrelay_cycle_duration_ms").record(duration_ms);
}

/// Record a source poll
pub fn record_source_polled(source: &str, success: bool, readings: usize) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "iotrelay_source_polls_total",
        "source" => source.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    if readings > 0 {
        counter!("iotrelay_readings_received_total", "source" => source.to_string())
            .increment(readings as u64);
    }
}

/// Record a delivery attempt to a handler
pub fn record_reading_delivered(handler: &str, reading_type: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "iotrelay_deliveries_total",
        "handler" => handler.to_string(),
        "reading_type" => reading_type.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a reading dropped before delivery
///
/// `reason` is `"null_value"` or `"unrouted"`.
pub fn record_reading_dropped(reading_type: &str, reason: &'static str) {
    counter!(
        "iotrelay_readings_dropped_total",
        "reading_type" => reading_type.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Record a handler flush at shutdown
pub fn record_handler_flushed(handler: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "iotrelay_flushes_total",
        "handler" => handler.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the registered plugin population
pub fn record_registered_plugins(sources: usize, handlers: usize) {
    gauge!("iotrelay_sources_registered").set(sources as f64);
    gauge!("iotrelay_handlers_registered").set(handlers as f64);
}
