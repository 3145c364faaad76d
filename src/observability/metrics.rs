//! Thread-safe metrics collection system
//!
//! Provides atomic counters and mutex-protected collections for tracking
//! task throughput, agent utilisation and operator usage.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Cap on retained evaluation timings
const MAX_EVALUATION_SAMPLES: usize = 1000;

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics and mutexes
pub struct MetricsCollector {
    // Task counters (atomic for high frequency)
    tasks_submitted: AtomicU64,
    tasks_rejected: AtomicU64,
    tasks_started: AtomicU64,
    tasks_in_flight: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,

    // Evaluation wall-clock times in milliseconds
    evaluation_times: Mutex<Vec<u64>>,

    // Per-operator statistics keyed by operator name
    operation_stats: Mutex<HashMap<String, OperationStats>>,

    uptime_start: AtomicU64,
}

#[derive(Debug, Default)]
struct OperationStats {
    applications: u64,
    simulated_ms: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            tasks_submitted: AtomicU64::new(0),
            tasks_rejected: AtomicU64::new(0),
            tasks_started: AtomicU64::new(0),
            tasks_in_flight: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            evaluation_times: Mutex::new(Vec::new()),
            operation_stats: Mutex::new(HashMap::new()),
            uptime_start: AtomicU64::new(current_timestamp()),
        }
    }

    // Task lifecycle metrics
    pub fn task_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_started(&self) {
        self.tasks_started.fetch_add(1, Ordering::Relaxed);
        self.tasks_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_completed(&self, duration: Duration) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        self.finish_in_flight(duration);
    }

    pub fn task_failed(&self, duration: Duration) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        self.finish_in_flight(duration);
    }

    fn finish_in_flight(&self, duration: Duration) {
        // Saturate so a reset during evaluation cannot wrap the gauge
        let _ = self
            .tasks_in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(1))
            });

        if let Ok(mut times) = self.evaluation_times.lock() {
            times.push(duration.as_millis() as u64);
            if times.len() > MAX_EVALUATION_SAMPLES {
                times.remove(0);
            }
        }
    }

    // Operator metrics
    pub fn operation_applied(&self, operation: &str, simulated: Duration) {
        if let Ok(mut stats) = self.operation_stats.lock() {
            let entry = stats.entry(operation.to_string()).or_default();
            entry.applications += 1;
            entry.simulated_ms += simulated.as_millis() as u64;
        }
    }

    // Reset all metrics (useful for testing)
    pub fn reset(&self) {
        self.tasks_submitted.store(0, Ordering::Relaxed);
        self.tasks_rejected.store(0, Ordering::Relaxed);
        self.tasks_started.store(0, Ordering::Relaxed);
        self.tasks_in_flight.store(0, Ordering::Relaxed);
        self.tasks_completed.store(0, Ordering::Relaxed);
        self.tasks_failed.store(0, Ordering::Relaxed);
        self.uptime_start
            .store(current_timestamp(), Ordering::Relaxed);

        if let Ok(mut times) = self.evaluation_times.lock() {
            times.clear();
        }
        if let Ok(mut stats) = self.operation_stats.lock() {
            stats.clear();
        }
    }

    /// Calculate evaluation time statistics (avg, p50, p95, p99)
    fn calculate_evaluation_statistics(&self) -> (f64, f64, f64, f64) {
        let Ok(times) = self.evaluation_times.lock() else {
            return (0.0, 0.0, 0.0, 0.0);
        };
        if times.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }

        let mut sorted_times = times.clone();
        sorted_times.sort_unstable();

        let avg = sorted_times.iter().sum::<u64>() as f64 / sorted_times.len() as f64;
        (
            avg,
            percentile(&sorted_times, 50.0),
            percentile(&sorted_times, 95.0),
            percentile(&sorted_times, 99.0),
        )
    }

    fn build_operation_statistics(&self) -> HashMap<String, OperationStatsSnapshot> {
        self.operation_stats
            .lock()
            .map(|stats| {
                stats
                    .iter()
                    .map(|(name, stats)| {
                        (
                            name.clone(),
                            OperationStatsSnapshot {
                                applications: stats.applications,
                                simulated_ms: stats.simulated_ms,
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get complete metrics snapshot
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        let (avg, p50, p95, p99) = self.calculate_evaluation_statistics();

        MetricsSnapshot {
            tasks: TaskMetrics {
                tasks_submitted: self.tasks_submitted.load(Ordering::Relaxed),
                tasks_rejected: self.tasks_rejected.load(Ordering::Relaxed),
                tasks_started: self.tasks_started.load(Ordering::Relaxed),
                tasks_in_flight: self.tasks_in_flight.load(Ordering::Relaxed),
                tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
                tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
                avg_evaluation_time_ms: avg,
                evaluation_time_p50_ms: p50,
                evaluation_time_p95_ms: p95,
                evaluation_time_p99_ms: p99,
            },
            operations: self.build_operation_statistics(),
            uptime_seconds: now.saturating_sub(self.uptime_start.load(Ordering::Relaxed)),
            timestamp: now,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

// Public metrics structures
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub tasks: TaskMetrics,
    pub operations: HashMap<String, OperationStatsSnapshot>,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct TaskMetrics {
    pub tasks_submitted: u64,
    pub tasks_rejected: u64,
    pub tasks_started: u64,
    pub tasks_in_flight: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub avg_evaluation_time_ms: f64,
    pub evaluation_time_p50_ms: f64,
    pub evaluation_time_p95_ms: f64,
    pub evaluation_time_p99_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct OperationStatsSnapshot {
    pub applications: u64,
    pub simulated_ms: u64,
}

// Helper functions
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let len = sorted_data.len();
    let index = (percentile / 100.0) * (len - 1) as f64;

    if index.fract() == 0.0 {
        sorted_data[index as usize] as f64
    } else {
        let lower_value = sorted_data[index.floor() as usize] as f64;
        let upper_value = sorted_data[index.ceil() as usize] as f64;

        lower_value + (upper_value - lower_value) * index.fract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_task_metrics() {
        let collector = MetricsCollector::new();

        collector.task_submitted();
        collector.task_started();
        collector.task_completed(Duration::from_millis(1500));

        let metrics = collector.get_metrics();
        assert_eq!(metrics.tasks.tasks_submitted, 1);
        assert_eq!(metrics.tasks.tasks_completed, 1);
        assert_eq!(metrics.tasks.tasks_in_flight, 0);
        assert!(metrics.tasks.avg_evaluation_time_ms > 1400.0);
    }

    #[test]
    fn test_failed_task_leaves_flight() {
        let collector = MetricsCollector::new();

        collector.task_started();
        collector.task_started();
        collector.task_failed(Duration::from_millis(5));

        let metrics = collector.get_metrics();
        assert_eq!(metrics.tasks.tasks_started, 2);
        assert_eq!(metrics.tasks.tasks_failed, 1);
        assert_eq!(metrics.tasks.tasks_in_flight, 1);
    }

    #[test]
    fn test_in_flight_never_wraps() {
        let collector = MetricsCollector::new();
        collector.task_completed(Duration::ZERO);
        assert_eq!(collector.get_metrics().tasks.tasks_in_flight, 0);
    }

    #[test]
    fn test_operation_metrics() {
        let collector = MetricsCollector::new();

        collector.operation_applied("Addition", Duration::from_millis(20));
        collector.operation_applied("Addition", Duration::from_millis(20));
        collector.operation_applied("Division", Duration::from_millis(50));

        let metrics = collector.get_metrics();
        let addition = metrics.operations.get("Addition").unwrap();
        assert_eq!(addition.applications, 2);
        assert_eq!(addition.simulated_ms, 40);
        assert_eq!(metrics.operations["Division"].applications, 1);
    }

    #[test]
    fn test_thread_safety() {
        let collector = Arc::new(MetricsCollector::new());

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let collector_clone = Arc::clone(&collector);
                thread::spawn(move || {
                    for _ in 0..100 {
                        collector_clone.task_submitted();
                        collector_clone.operation_applied("Subtraction", Duration::ZERO);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let metrics = collector.get_metrics();
        assert_eq!(metrics.tasks.tasks_submitted, 1000);
        assert_eq!(metrics.operations["Subtraction"].applications, 1000);
    }

    #[test]
    fn test_percentile_calculation() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

        let p50 = percentile(&data, 50.0);
        let p95 = percentile(&data, 95.0);

        assert!((p50 - 5.5).abs() < 0.1, "P50: expected ~5.5, got {p50}");
        assert!((p95 - 9.5).abs() < 0.1, "P95: expected ~9.5, got {p95}");
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_evaluation_samples_are_bounded() {
        let collector = MetricsCollector::new();

        for i in 0..1500 {
            collector.task_completed(Duration::from_millis(i));
        }

        let len = collector.evaluation_times.lock().unwrap().len();
        assert_eq!(len, MAX_EVALUATION_SAMPLES);
    }

    #[test]
    fn test_reset_functionality() {
        let collector = MetricsCollector::new();

        collector.task_submitted();
        collector.operation_applied("Multiplication", Duration::from_millis(25));
        collector.reset();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.tasks.tasks_submitted, 0);
        assert!(metrics.operations.is_empty());
    }
}
