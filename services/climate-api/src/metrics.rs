//! Prometheus metrics for the climate API.

use std::time::Instant;

use metrics::{counter, histogram};

/// Count a request to `endpoint`.
pub fn record_request(endpoint: &'static str) {
    counter!("climate_requests_total", "endpoint" => endpoint).increment(1);
}

/// Count a failed request by error kind.
pub fn record_error(endpoint: &'static str, kind: &'static str) {
    counter!("climate_request_errors_total", "endpoint" => endpoint, "kind" => kind).increment(1);
}

/// Number of rows returned by the data endpoint after sampling.
pub fn record_points(points: usize) {
    histogram!("climate_points_returned").record(points as f64);
}

/// Total dataset opens so far, as tracked by the dataset cache.
pub fn record_dataset_opens(total: u64) {
    counter!("climate_dataset_opens_total").absolute(total);
}

/// Times a request and records its duration when finished.
#[derive(Debug)]
pub struct RequestTimer {
    endpoint: &'static str,
    start: Instant,
}

impl RequestTimer {
    /// Start timing and count the request.
    pub fn start(endpoint: &'static str) -> Self {
        record_request(endpoint);
        Self {
            endpoint,
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        histogram!("climate_request_duration_seconds", "endpoint" => self.endpoint)
            .record(self.start.elapsed().as_secs_f64());
    }
}
