//! Metrics collection.
//!
//! # Metrics
//! - `hedera_ops_requests_total` (counter): requests by operation, outcome
//! - `hedera_ops_submissions_total` (counter): submissions by final status
//! - `hedera_ops_submission_duration_seconds` (histogram): submit to terminal state
//! - `hedera_ops_receipt_wait_seconds` (histogram): submit to final receipt
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; a no-op until a recorder is installed
//! - Status labels are the closed ledger status set, so cardinality stays bounded

use std::time::Duration;

/// Count one dispatched request.
pub fn record_request(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        "hedera_ops_requests_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Count a submission reaching a terminal state.
pub fn record_submission(status: &str, elapsed: Duration) {
    metrics::counter!("hedera_ops_submissions_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("hedera_ops_submission_duration_seconds").record(elapsed.as_secs_f64());
}

/// Time from submission until a final receipt was observed.
pub fn record_receipt_wait(elapsed: Duration) {
    metrics::histogram!("hedera_ops_receipt_wait_seconds").record(elapsed.as_secs_f64());
}
