//! Processing metrics for the prediction service.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for upload processing
pub struct PipelineMetrics {
    /// Uploads that produced predictions
    pub uploads_processed: AtomicU64,
    /// Uploads rejected or aborted
    pub uploads_failed: AtomicU64,
    /// Rows predicted across all uploads
    pub rows_predicted: AtomicU64,
    /// Failures by error kind
    failures_by_kind: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Rows per predicted online-order label
    label_counts: RwLock<HashMap<i64, u64>>,
    /// Sum of predicted costs, for the running mean
    cost_sum: RwLock<f64>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            uploads_processed: AtomicU64::new(0),
            uploads_failed: AtomicU64::new(0),
            rows_predicted: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            label_counts: RwLock::new(HashMap::new()),
            cost_sum: RwLock::new(0.0),
            start_time: Instant::now(),
        }
    }

    /// Record a successfully processed upload
    pub fn record_upload(&self, processing_time: Duration, labels: &[i64], costs: &[f64]) {
        self.uploads_processed.fetch_add(1, Ordering::Relaxed);
        self.rows_predicted
            .fetch_add(labels.len() as u64, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if let Ok(mut counts) = self.label_counts.write() {
            for &label in labels {
                *counts.entry(label).or_insert(0) += 1;
            }
        }

        if let Ok(mut sum) = self.cost_sum.write() {
            *sum += costs.iter().filter(|c| c.is_finite()).sum::<f64>();
        }
    }

    /// Record a failed upload
    pub fn record_failure(&self, kind: &str) {
        self.uploads_failed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => {
                let mut sorted = times.clone();
                sorted.sort_unstable();
                sorted
            }
            _ => return ProcessingStats::default(),
        };

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get mean predicted cost across all predicted rows
    pub fn get_mean_cost(&self) -> f64 {
        let rows = self.rows_predicted.load(Ordering::Relaxed);
        let sum = self.cost_sum.read().map(|s| *s).unwrap_or(0.0);
        if rows > 0 {
            sum / rows as f64
        } else {
            0.0
        }
    }

    /// Get current throughput (rows per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.rows_predicted.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get rows per predicted online-order label
    pub fn get_label_counts(&self) -> HashMap<i64, u64> {
        self.label_counts
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Get failures by error kind
    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    /// Point-in-time copy of every metric
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            uploads_processed: self.uploads_processed.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
            rows_predicted: self.rows_predicted.load(Ordering::Relaxed),
            failures_by_kind: self.get_failures_by_kind(),
            online_order_labels: self
                .get_label_counts()
                .into_iter()
                .map(|(label, count)| (label.to_string(), count))
                .collect(),
            mean_predicted_cost: self.get_mean_cost(),
            processing: self.get_processing_stats(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let processing = &snapshot.processing;

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            RESTAURANT PREDICTOR - METRICS SUMMARY            ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Uploads Processed: {:>8}  │  Failed: {:>8}              ║",
            snapshot.uploads_processed, snapshot.uploads_failed
        );
        info!(
            "║ Rows Predicted:    {:>8}  │  Throughput: {:>8.1} rows/s ║",
            snapshot.rows_predicted,
            self.get_throughput()
        );
        info!(
            "║ Processing Time (μs): mean={:>7} p50={:>7} p95={:>7}     ║",
            processing.mean_us, processing.p50_us, processing.p95_us
        );
        info!(
            "║ Mean Predicted Cost: {:>10.1}                              ║",
            snapshot.mean_predicted_cost
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Online Order Predictions:                                    ║");
        for (label, count) in &snapshot.online_order_labels {
            info!("║   {:>3}: {:>8}                                              ║", label, count);
        }
        if !snapshot.failures_by_kind.is_empty() {
            info!("║ Failures by Kind:                                            ║");
            for (kind, count) in &snapshot.failures_by_kind {
                info!("║   {:18}: {:>6}                                  ║", kind, count);
            }
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable view of the metrics, served at `/metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub uploads_processed: u64,
    pub uploads_failed: u64,
    pub rows_predicted: u64,
    pub failures_by_kind: HashMap<String, u64>,
    pub online_order_labels: HashMap<String, u64>,
    pub mean_predicted_cost: f64,
    pub processing: ProcessingStats,
}

/// Periodic metrics summary logger
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
