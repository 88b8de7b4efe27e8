//! In-process metrics for feature calls.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use crate::errors::ErrorKind;

/// Metrics collector interface.
pub trait MetricsCollector: Send + Sync + std::fmt::Debug {
    /// Records one completed feature call.
    fn record_request(&self, operation: &str, success: bool, duration: Duration);

    /// Records chat token usage.
    fn record_tokens(&self, prompt_tokens: u32, completion_tokens: u32);

    /// Records which model served a chat call.
    fn record_model_usage(&self, model: &str);

    /// Records a failure by kind.
    fn record_error(&self, kind: ErrorKind);

    /// Records a call answered from fixtures.
    fn record_mock_hit(&self, operation: &str);

    /// Current values.
    fn snapshot(&self) -> MetricsSnapshot;

    /// Resets all metrics.
    fn reset(&self);
}

/// Point-in-time metrics, served at `/api/metrics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Total calls.
    pub total_requests: u64,
    /// Successful calls.
    pub successful_requests: u64,
    /// Failed calls.
    pub failed_requests: u64,
    /// Summed latency in milliseconds.
    pub total_latency_ms: u64,
    /// Prompt tokens.
    pub prompt_tokens: u64,
    /// Completion tokens.
    pub completion_tokens: u64,
    /// Calls answered from fixtures.
    pub mock_hits: u64,
    /// Calls per operation.
    pub operations: BTreeMap<String, u64>,
    /// Chat calls per model.
    pub models: BTreeMap<String, u64>,
    /// Failures per error kind.
    pub errors: BTreeMap<String, u64>,
}

impl MetricsSnapshot {
    /// Average latency in milliseconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_latency_ms(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.total_requests as f64
        }
    }

    /// Success rate as a percentage; 100 when nothing ran yet.
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            100.0
        } else {
            (self.successful_requests as f64 / self.total_requests as f64) * 100.0
        }
    }

    /// Total tokens.
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Atomic counters plus lock-guarded maps.
#[derive(Default)]
pub struct DefaultMetricsCollector {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_latency_ms: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    mock_hits: AtomicU64,
    operations: RwLock<BTreeMap<String, u64>>,
    models: RwLock<BTreeMap<String, u64>>,
    errors: RwLock<BTreeMap<String, u64>>,
}

impl DefaultMetricsCollector {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }
}

fn bump(map: &RwLock<BTreeMap<String, u64>>, key: &str) {
    if let Ok(mut map) = map.write() {
        *map.entry(key.to_string()).or_insert(0) += 1;
    }
}

fn read(map: &RwLock<BTreeMap<String, u64>>) -> BTreeMap<String, u64> {
    map.read().map(|m| m.clone()).unwrap_or_default()
}

impl MetricsCollector for DefaultMetricsCollector {
    fn record_request(&self, operation: &str, success: bool, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ms.fetch_add(
            u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
        bump(&self.operations, operation);
    }

    fn record_tokens(&self, prompt_tokens: u32, completion_tokens: u32) {
        self.prompt_tokens
            .fetch_add(u64::from(prompt_tokens), Ordering::Relaxed);
        self.completion_tokens
            .fetch_add(u64::from(completion_tokens), Ordering::Relaxed);
    }

    fn record_model_usage(&self, model: &str) {
        bump(&self.models, model);
    }

    fn record_error(&self, kind: ErrorKind) {
        bump(&self.errors, kind.as_str());
    }

    fn record_mock_hit(&self, _operation: &str) {
        self.mock_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            total_latency_ms: self.total_latency_ms.load(Ordering::Relaxed),
            prompt_tokens: self.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.completion_tokens.load(Ordering::Relaxed),
            mock_hits: self.mock_hits.load(Ordering::Relaxed),
            operations: read(&self.operations),
            models: read(&self.models),
            errors: read(&self.errors),
        }
    }

    fn reset(&self) {
        for counter in [
            &self.total_requests,
            &self.successful_requests,
            &self.failed_requests,
            &self.total_latency_ms,
            &self.prompt_tokens,
            &self.completion_tokens,
            &self.mock_hits,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        for map in [&self.operations, &self.models, &self.errors] {
            if let Ok(mut map) = map.write() {
                map.clear();
            }
        }
    }
}

impl std::fmt::Debug for DefaultMetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultMetricsCollector")
            .field("total_requests", &self.total_requests.load(Ordering::Relaxed))
            .field("failed_requests", &self.failed_requests.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
