//! Observability: tracing setup, log redaction and in-process metrics.

mod logging;
mod metrics;

pub use logging::{init_tracing, loggable_body, redact, LogFormat, DEFAULT_FILTER};
pub use metrics::{DefaultMetricsCollector, MetricsCollector, MetricsSnapshot};

use std::time::Duration;
use tokio::time::Instant;

/// Measures how long one feature call takes.
#[derive(Debug)]
pub struct RequestTimer {
    start: Instant,
    operation: &'static str,
}

impl RequestTimer {
    /// Starts timing `operation`.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// The operation name.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}
