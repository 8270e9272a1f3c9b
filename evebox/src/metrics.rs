//! Report pipeline metrics
//!
//! Emitted through the `metrics` facade; installing a recorder is up to the
//! embedding application.

use std::time::Duration;

/// Record a completed aggregation query
pub fn record_request(status: &str, duration: Duration) {
    ::metrics::counter!(
        "evebox_report_requests_total",
        "status" => status.to_string(),
    )
    .increment(1);

    ::metrics::histogram!("evebox_report_request_duration_seconds").record(duration.as_secs_f64());
}

/// Record a response dropped because a newer request was issued
pub fn record_stale() {
    ::metrics::counter!("evebox_report_stale_total").increment(1);
}

/// Record rows dropped because the backend exceeded the requested size
pub fn record_truncated(dropped: usize) {
    ::metrics::counter!("evebox_report_truncated_rows_total").increment(dropped as u64);
}
