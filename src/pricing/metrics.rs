// Performance Metrics for the Pricing System
//
// Tracks evaluation counts, strategy cache hit rates, and slow runs
// to help identify performance bottlenecks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Performance threshold for slow operations (50ms)
///
/// A single pricing run is pure computation; anything slower than this
/// points at an oversized strategy or a degenerate fact base.
const SLOW_OPERATION_THRESHOLD_MS: u64 = 50;

/// Performance metrics for the pricing system
#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    // Strategy cache metrics
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,

    // Operation counts
    quote_evaluations: AtomicU64,
    failed_evaluations: AtomicU64,
    batch_runs: AtomicU64,
    batch_items: AtomicU64,

    // Timing metrics (in microseconds)
    total_quote_time_us: AtomicU64,

    // Slow operation counts
    slow_quote_evaluations: AtomicU64,
}

impl PerformanceMetrics {
    /// Create a new PerformanceMetrics instance
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                cache_hits: AtomicU64::new(0),
                cache_misses: AtomicU64::new(0),
                quote_evaluations: AtomicU64::new(0),
                failed_evaluations: AtomicU64::new(0),
                batch_runs: AtomicU64::new(0),
                batch_items: AtomicU64::new(0),
                total_quote_time_us: AtomicU64::new(0),
                slow_quote_evaluations: AtomicU64::new(0),
            }),
        }
    }

    /// Record a strategy cache hit
    pub fn record_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a strategy cache miss
    pub fn record_cache_miss(&self) {
        self.inner.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed quote evaluation
    pub fn record_failed_evaluation(&self) {
        self.inner.failed_evaluations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the start of a batch run of the given size
    pub fn record_batch_run(&self, items: usize) {
        self.inner.batch_runs.fetch_add(1, Ordering::Relaxed);
        self.inner.batch_items.fetch_add(items as u64, Ordering::Relaxed);
    }

    /// Strategy cache hit rate (0.0 to 1.0)
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.inner.cache_hits.load(Ordering::Relaxed);
        let misses = self.inner.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Start timing a quote evaluation
    pub fn start_quote_evaluation(&self) -> OperationTimer {
        OperationTimer::new(self.clone())
    }

    /// Record a quote evaluation completion
    fn record_quote_evaluation(&self, duration: Duration) {
        self.inner.quote_evaluations.fetch_add(1, Ordering::Relaxed);
        self.inner
            .total_quote_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() as u64 > SLOW_OPERATION_THRESHOLD_MS {
            self.inner.slow_quote_evaluations.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Slow quote evaluation: {}ms", duration.as_millis());
        }
    }

    /// Average quote evaluation time in milliseconds
    pub fn avg_quote_time_ms(&self) -> f64 {
        let count = self.inner.quote_evaluations.load(Ordering::Relaxed);
        let total_us = self.inner.total_quote_time_us.load(Ordering::Relaxed);

        if count == 0 {
            0.0
        } else {
            (total_us as f64 / count as f64) / 1000.0
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            cache_hit_rate: self.cache_hit_rate(),
            cache_hits: self.inner.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.inner.cache_misses.load(Ordering::Relaxed),
            quote_evaluations: self.inner.quote_evaluations.load(Ordering::Relaxed),
            failed_evaluations: self.inner.failed_evaluations.load(Ordering::Relaxed),
            avg_quote_time_ms: self.avg_quote_time_ms(),
            slow_quote_evaluations: self.inner.slow_quote_evaluations.load(Ordering::Relaxed),
            batch_runs: self.inner.batch_runs.load(Ordering::Relaxed),
            batch_items: self.inner.batch_items.load(Ordering::Relaxed),
        }
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer for tracking quote evaluation duration
///
/// Records on drop, so early returns and error paths are still counted.
pub struct OperationTimer {
    start: Instant,
    metrics: PerformanceMetrics,
}

impl OperationTimer {
    fn new(metrics: PerformanceMetrics) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.metrics.record_quote_evaluation(duration);
    }
}

/// Summary of performance metrics
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub cache_hit_rate: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub quote_evaluations: u64,
    pub failed_evaluations: u64,
    pub avg_quote_time_ms: f64,
    pub slow_quote_evaluations: u64,
    pub batch_runs: u64,
    pub batch_items: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = PerformanceMetrics::new();
        assert_eq!(metrics.cache_hit_rate(), 0.0);
        assert_eq!(metrics.avg_quote_time_ms(), 0.0);
    }

    #[test]
    fn test_cache_metrics() {
        let metrics = PerformanceMetrics::new();

        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();

        assert_eq!(metrics.cache_hit_rate(), 2.0 / 3.0);
    }

    #[test]
    fn test_operation_timer_records_on_drop() {
        let metrics = PerformanceMetrics::new();

        {
            let _timer = metrics.start_quote_evaluation();
            thread::sleep(Duration::from_millis(5));
        }

        let summary = metrics.summary();
        assert_eq!(summary.quote_evaluations, 1);
        assert!(summary.avg_quote_time_ms >= 5.0);
    }

    #[test]
    fn test_batch_counters() {
        let metrics = PerformanceMetrics::new();

        metrics.record_batch_run(5);
        metrics.record_batch_run(3);

        let summary = metrics.summary();
        assert_eq!(summary.batch_runs, 2);
        assert_eq!(summary.batch_items, 8);
    }

    #[test]
    fn test_failed_evaluation_counter() {
        let metrics = PerformanceMetrics::new();
        metrics.record_failed_evaluation();

        assert_eq!(metrics.summary().failed_evaluations, 1);
    }
}
