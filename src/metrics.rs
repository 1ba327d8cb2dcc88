//! Prediction counters and latency statistics.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for user-triggered predictions
pub struct PredictionMetrics {
    /// Predictions that produced a value
    pub predictions_succeeded: AtomicU64,
    /// Predictions where the model was invoked and failed
    pub predictions_failed: AtomicU64,
    /// Requests turned away because no model is loaded
    pub requests_unavailable: AtomicU64,
    /// Inference times (in microseconds)
    inference_times: RwLock<Vec<u64>>,
    /// Start time for uptime reporting
    start_time: Instant,
}

impl PredictionMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions_succeeded: AtomicU64::new(0),
            predictions_failed: AtomicU64::new(0),
            requests_unavailable: AtomicU64::new(0),
            inference_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_success(&self, inference_time: Duration) {
        self.predictions_succeeded.fetch_add(1, Ordering::Relaxed);
        self.record_time(inference_time);
    }

    /// Record a failed prediction
    pub fn record_failure(&self, inference_time: Duration) {
        self.predictions_failed.fetch_add(1, Ordering::Relaxed);
        self.record_time(inference_time);
    }

    /// Record a request made while the model is unavailable
    pub fn record_unavailable(&self) {
        self.requests_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    fn record_time(&self, inference_time: Duration) {
        if let Ok(mut times) = self.inference_times.write() {
            times.push(inference_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get inference time statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let mut sorted: Vec<u64> = match self.inference_times.read() {
            Ok(times) => times.clone(),
            Err(_) => return LatencyStats::default(),
        };
        if sorted.is_empty() {
            return LatencyStats::default();
        }
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
            max_us: sorted[count - 1],
        }
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            predictions_succeeded: self.predictions_succeeded.load(Ordering::Relaxed),
            predictions_failed: self.predictions_failed.load(Ordering::Relaxed),
            requests_unavailable: self.requests_unavailable.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().as_secs(),
            latency: self.get_latency_stats(),
        }
    }

    /// Log summary statistics
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        let total = snapshot.predictions_succeeded + snapshot.predictions_failed;
        let failure_rate = if total > 0 {
            (snapshot.predictions_failed as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        info!(
            succeeded = snapshot.predictions_succeeded,
            failed = snapshot.predictions_failed,
            unavailable = snapshot.requests_unavailable,
            failure_rate = format!("{:.1}%", failure_rate),
            uptime_secs = snapshot.uptime_secs,
            "Prediction summary"
        );
        if snapshot.latency.count > 0 {
            info!(
                mean_us = snapshot.latency.mean_us,
                p50_us = snapshot.latency.p50_us,
                p99_us = snapshot.latency.p99_us,
                max_us = snapshot.latency.max_us,
                "Inference latency"
            );
        }
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Inference time statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub predictions_succeeded: u64,
    pub predictions_failed: u64,
    pub requests_unavailable: u64,
    pub uptime_secs: u64,
    pub latency: LatencyStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = PredictionMetrics::new();

        metrics.record_success(Duration::from_micros(100));
        metrics.record_success(Duration::from_micros(300));
        metrics.record_failure(Duration::from_micros(200));
        metrics.record_unavailable();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.predictions_succeeded, 2);
        assert_eq!(snapshot.predictions_failed, 1);
        assert_eq!(snapshot.requests_unavailable, 1);

        let latency = snapshot.latency;
        assert_eq!(latency.count, 3);
        assert_eq!(latency.mean_us, 200);
        assert_eq!(latency.p50_us, 200);
        assert_eq!(latency.max_us, 300);
    }

    #[test]
    fn test_empty_latency() {
        let stats = PredictionMetrics::new().get_latency_stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.max_us, 0);
    }
}
