//! Batch counters and job duration percentiles.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maximum number of duration samples kept.
const MAX_DURATION_SAMPLES: usize = 1000;

/// Counters for one batch run.
#[derive(Debug)]
pub struct BatchMetrics {
    /// Jobs taken from the queue.
    pub jobs_started: AtomicU64,
    /// Jobs that produced a document.
    pub jobs_succeeded: AtomicU64,
    /// Jobs skipped because the source had no 3D content.
    pub jobs_skipped: AtomicU64,
    /// Jobs that ended without a document for any other reason.
    pub jobs_failed: AtomicU64,
    /// Subset of failed jobs that hit the polling ceiling.
    pub jobs_timed_out: AtomicU64,
    /// Total bytes of documents produced.
    pub total_output_bytes: AtomicU64,
    duration_samples: Mutex<Vec<Duration>>,
}

impl BatchMetrics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self {
            jobs_started: AtomicU64::new(0),
            jobs_succeeded: AtomicU64::new(0),
            jobs_skipped: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
            jobs_timed_out: AtomicU64::new(0),
            total_output_bytes: AtomicU64::new(0),
            duration_samples: Mutex::new(Vec::new()),
        }
    }

    /// Record a job start.
    pub fn record_started(&self) {
        self.jobs_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a produced document.
    pub fn record_success(&self, duration: Duration, output_bytes: u64) {
        self.jobs_succeeded.fetch_add(1, Ordering::Relaxed);
        self.total_output_bytes
            .fetch_add(output_bytes, Ordering::Relaxed);
        self.add_duration_sample(duration);
    }

    /// Record a 2D source.
    pub fn record_skipped(&self, duration: Duration) {
        self.jobs_skipped.fetch_add(1, Ordering::Relaxed);
        self.add_duration_sample(duration);
    }

    /// Record a failed job.
    pub fn record_failure(&self, duration: Duration) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        self.add_duration_sample(duration);
    }

    /// Record a timed-out job; it also counts as failed.
    pub fn record_timeout(&self, duration: Duration) {
        self.jobs_timed_out.fetch_add(1, Ordering::Relaxed);
        self.record_failure(duration);
    }

    fn add_duration_sample(&self, duration: Duration) {
        if let Ok(mut samples) = self.duration_samples.lock() {
            if samples.len() >= MAX_DURATION_SAMPLES {
                samples.remove(0);
            }
            samples.push(duration);
        }
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let durations = self
            .duration_samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        let (p50, p95) = percentiles(&durations);

        MetricsSnapshot {
            jobs_started: self.jobs_started.load(Ordering::Relaxed),
            jobs_succeeded: self.jobs_succeeded.load(Ordering::Relaxed),
            jobs_skipped: self.jobs_skipped.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            jobs_timed_out: self.jobs_timed_out.load(Ordering::Relaxed),
            total_output_bytes: self.total_output_bytes.load(Ordering::Relaxed),
            duration_p50: p50,
            duration_p95: p95,
        }
    }
}

impl Default for BatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn percentiles(durations: &[Duration]) -> (Option<Duration>, Option<Duration>) {
    if durations.is_empty() {
        return (None, None);
    }
    let mut sorted = durations.to_vec();
    sorted.sort();
    let len = sorted.len();
    (
        sorted.get(len * 50 / 100).copied(),
        sorted.get((len * 95 / 100).min(len - 1)).copied(),
    )
}

/// Serializable batch counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Jobs taken from the queue.
    pub jobs_started: u64,
    /// Jobs that produced a document.
    pub jobs_succeeded: u64,
    /// Jobs skipped as 2D.
    pub jobs_skipped: u64,
    /// Jobs that failed.
    pub jobs_failed: u64,
    /// Failed jobs that timed out.
    pub jobs_timed_out: u64,
    /// Total bytes of documents produced.
    pub total_output_bytes: u64,
    /// Median job duration.
    #[serde(with = "crate::report::opt_duration_ms")]
    pub duration_p50: Option<Duration>,
    /// 95th percentile job duration.
    #[serde(with = "crate::report::opt_duration_ms")]
    pub duration_p95: Option<Duration>,
}
