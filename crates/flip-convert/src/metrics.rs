//! Transform metrics.
//!
//! Tracks request counts, byte volumes, and durations. Thread-safe via
//! atomics for counters and a mutex for the duration samples.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Transform metrics collector.
///
/// Shared between the orchestrator and the worker task.
#[derive(Debug)]
pub struct TransformMetrics {
    /// Requests handed to the transform stage.
    pub requests_started: AtomicU64,
    /// Requests that produced a single file or archive.
    pub requests_succeeded: AtomicU64,
    /// Requests that ended in failure.
    pub requests_failed: AtomicU64,
    /// Requests that ran inline because the worker was unavailable.
    pub inline_fallbacks: AtomicU64,
    /// Worker messages dropped because their request was superseded.
    pub stale_discarded: AtomicU64,
    /// Total bytes of input submitted.
    pub total_input_bytes: AtomicU64,
    /// Total bytes of output produced.
    pub total_output_bytes: AtomicU64,
    duration_samples: Mutex<Vec<Duration>>,
}

/// Maximum number of duration samples to keep in memory.
const MAX_DURATION_SAMPLES: usize = 1000;

impl TransformMetrics {
    /// Create a new empty metrics collector.
    pub fn new() -> Self {
        Self {
            requests_started: AtomicU64::new(0),
            requests_succeeded: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            inline_fallbacks: AtomicU64::new(0),
            stale_discarded: AtomicU64::new(0),
            total_input_bytes: AtomicU64::new(0),
            total_output_bytes: AtomicU64::new(0),
            duration_samples: Mutex::new(Vec::with_capacity(MAX_DURATION_SAMPLES)),
        }
    }

    /// Record a request start with its total input size.
    pub fn record_started(&self, input_bytes: u64) {
        self.requests_started.fetch_add(1, Ordering::Relaxed);
        self.total_input_bytes
            .fetch_add(input_bytes, Ordering::Relaxed);
    }

    /// Record a successful request with its duration and output size.
    pub fn record_success(&self, duration: Duration, output_bytes: u64) {
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
        self.total_output_bytes
            .fetch_add(output_bytes, Ordering::Relaxed);
        self.add_duration_sample(duration);
    }

    /// Record a failed request.
    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that fell back to inline execution.
    pub fn record_inline_fallback(&self) {
        self.inline_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a discarded stale message.
    pub fn record_stale(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Add a duration sample, evicting the oldest if at capacity.
    fn add_duration_sample(&self, duration: Duration) {
        if let Ok(mut samples) = self.duration_samples.lock() {
            if samples.len() >= MAX_DURATION_SAMPLES {
                samples.remove(0);
            }
            samples.push(duration);
        }
    }

    /// Get the current snapshot of metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let durations = self
            .duration_samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();

        let (p50, p95, p99) = Self::calculate_percentiles(&durations);

        MetricsSnapshot {
            requests_started: self.requests_started.load(Ordering::Relaxed),
            requests_succeeded: self.requests_succeeded.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            inline_fallbacks: self.inline_fallbacks.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
            total_input_bytes: self.total_input_bytes.load(Ordering::Relaxed),
            total_output_bytes: self.total_output_bytes.load(Ordering::Relaxed),
            duration_p50: p50,
            duration_p95: p95,
            duration_p99: p99,
            sample_count: durations.len() as u64,
        }
    }

    fn calculate_percentiles(
        durations: &[Duration],
    ) -> (Option<Duration>, Option<Duration>, Option<Duration>) {
        if durations.is_empty() {
            return (None, None, None);
        }

        let mut sorted = durations.to_vec();
        sorted.sort();
        let len = sorted.len();

        let p50 = sorted.get(len * 50 / 100).copied();
        let p95 = sorted.get(len * 95 / 100).copied();
        let p99 = sorted.get(len.saturating_sub(1) * 99 / 100).copied();

        (p50, p95, p99)
    }
}

impl Default for TransformMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of transform metrics.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    /// Requests started.
    pub requests_started: u64,
    /// Requests succeeded.
    pub requests_succeeded: u64,
    /// Requests failed.
    pub requests_failed: u64,
    /// Inline fallbacks.
    pub inline_fallbacks: u64,
    /// Stale messages discarded.
    pub stale_discarded: u64,
    /// Input bytes submitted.
    pub total_input_bytes: u64,
    /// Output bytes produced.
    pub total_output_bytes: u64,
    /// P50 request duration.
    #[serde(with = "opt_duration_ms")]
    pub duration_p50: Option<Duration>,
    /// P95 request duration.
    #[serde(with = "opt_duration_ms")]
    pub duration_p95: Option<Duration>,
    /// P99 request duration.
    #[serde(with = "opt_duration_ms")]
    pub duration_p99: Option<Duration>,
    /// Number of duration samples collected.
    pub sample_count: u64,
}

/// Optional durations as whole milliseconds.
mod opt_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: Option<u64> = Option::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}
