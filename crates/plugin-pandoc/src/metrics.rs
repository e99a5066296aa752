//! Conversion counters.
//!
//! Thread-safe via atomics; shared between the pipeline and whatever
//! surface reports them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Conversion metrics collector.
#[derive(Debug, Default)]
pub struct ConversionMetrics {
    conversions_started: AtomicU64,
    conversions_succeeded: AtomicU64,
    conversions_failed: AtomicU64,
    conversions_timed_out: AtomicU64,
    conversions_cancelled: AtomicU64,
    html_fallbacks: AtomicU64,
    total_output_bytes: AtomicU64,
    total_duration_ms: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Converter processes spawned.
    pub started: u64,
    /// Conversions that produced output.
    pub succeeded: u64,
    /// Conversions that failed for any reason, timeouts included.
    pub failed: u64,
    /// Conversions killed at the deadline.
    pub timed_out: u64,
    /// Conversions cancelled by the caller.
    pub cancelled: u64,
    /// Renders served as HTML because conversion was unavailable.
    pub fallbacks: u64,
    /// Bytes of converted output.
    pub output_bytes: u64,
    /// Mean duration of successful conversions.
    pub avg_duration_ms: u64,
}

impl ConversionMetrics {
    /// Create a new empty metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a conversion start.
    pub fn record_started(&self) {
        self.conversions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful conversion with its duration and output size.
    pub fn record_success(&self, duration: Duration, output_bytes: u64) {
        self.conversions_succeeded.fetch_add(1, Ordering::Relaxed);
        self.total_output_bytes
            .fetch_add(output_bytes, Ordering::Relaxed);
        self.total_duration_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record a failed conversion.
    pub fn record_failure(&self) {
        self.conversions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a timed-out conversion.
    pub fn record_timeout(&self) {
        self.conversions_timed_out.fetch_add(1, Ordering::Relaxed);
        self.conversions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cancelled conversion.
    pub fn record_cancelled(&self) {
        self.conversions_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an HTML fallback.
    pub fn record_fallback(&self) {
        self.html_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let succeeded = self.conversions_succeeded.load(Ordering::Relaxed);
        let total_ms = self.total_duration_ms.load(Ordering::Relaxed);
        MetricsSnapshot {
            started: self.conversions_started.load(Ordering::Relaxed),
            succeeded,
            failed: self.conversions_failed.load(Ordering::Relaxed),
            timed_out: self.conversions_timed_out.load(Ordering::Relaxed),
            cancelled: self.conversions_cancelled.load(Ordering::Relaxed),
            fallbacks: self.html_fallbacks.load(Ordering::Relaxed),
            output_bytes: self.total_output_bytes.load(Ordering::Relaxed),
            avg_duration_ms: total_ms.checked_div(succeeded).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let metrics = ConversionMetrics::new();
        metrics.record_started();
        metrics.record_success(Duration::from_millis(30), 100);
        metrics.record_started();
        metrics.record_success(Duration::from_millis(10), 50);
        metrics.record_started();
        metrics.record_timeout();
        metrics.record_fallback();

        let snap = metrics.snapshot();
        assert_eq!(snap.started, 3);
        assert_eq!(snap.succeeded, 2);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.timed_out, 1);
        assert_eq!(snap.fallbacks, 1);
        assert_eq!(snap.output_bytes, 150);
        assert_eq!(snap.avg_duration_ms, 20);
    }

    #[test]
    fn test_empty_average_is_zero() {
        assert_eq!(ConversionMetrics::new().snapshot().avg_duration_ms, 0);
    }
}
