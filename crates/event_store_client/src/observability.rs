//! Metric names and recording helpers shared by the client and its wrappers.

use std::time::Duration;

pub const REQUESTS_TOTAL: &str = "event_store_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "event_store_request_duration_seconds";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Record one finished remote call.
pub fn record_request(operation: &str, outcome: Outcome, elapsed: Duration) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS, "operation" => operation.to_string())
        .record(elapsed.as_secs_f64());
}
