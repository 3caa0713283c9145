//! In-process counters and timing for scoring requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector shared by every request handled by one scorer
pub struct ScoringMetrics {
    /// Batches that completed successfully
    pub batches_scored: AtomicU64,
    /// Single records scored
    pub records_scored: AtomicU64,
    /// Rows scored across all batches
    pub rows_scored: AtomicU64,
    /// Rows predicted as fraud across all batches
    pub frauds_predicted: AtomicU64,
    /// Failed requests by error kind
    failures: RwLock<HashMap<&'static str, u64>>,
    /// Batch processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    start_time: Instant,
}

impl ScoringMetrics {
    pub fn new() -> Self {
        Self {
            batches_scored: AtomicU64::new(0),
            records_scored: AtomicU64::new(0),
            rows_scored: AtomicU64::new(0),
            frauds_predicted: AtomicU64::new(0),
            failures: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successfully scored batch
    pub fn record_batch(&self, processing_time: Duration, rows: usize, frauds: usize) {
        self.batches_scored.fetch_add(1, Ordering::Relaxed);
        self.rows_scored.fetch_add(rows as u64, Ordering::Relaxed);
        self.frauds_predicted.fetch_add(frauds as u64, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    pub fn record_record(&self) {
        self.records_scored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed request
    pub fn record_failure(&self, kind: &'static str) {
        if let Ok(mut failures) = self.failures.write() {
            *failures.entry(kind).or_insert(0) += 1;
        }
    }

    pub fn get_failures(&self) -> HashMap<&'static str, u64> {
        self.failures
            .read()
            .map(|failures| failures.clone())
            .unwrap_or_default()
    }

    /// Share of scored rows predicted as fraud, percent
    pub fn get_fraud_rate(&self) -> f64 {
        let rows = self.rows_scored.load(Ordering::Relaxed);
        if rows == 0 {
            return 0.0;
        }
        self.frauds_predicted.load(Ordering::Relaxed) as f64 / rows as f64 * 100.0
    }

    /// Get batch processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(times) => times,
            Err(_) => return ProcessingStats::default(),
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let batches = self.batches_scored.load(Ordering::Relaxed);
        let records = self.records_scored.load(Ordering::Relaxed);
        let rows = self.rows_scored.load(Ordering::Relaxed);
        let frauds = self.frauds_predicted.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();
        let failures = self.get_failures();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║               FRAUD SCORING - METRICS SUMMARY                ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Batches Scored: {:>8}  │  Single Records: {:>8}          ║",
            batches, records
        );
        info!(
            "║ Rows Scored:    {:>8}  │  Predicted Fraud: {:>6} ({:>5.1}%) ║",
            rows,
            frauds,
            self.get_fraud_rate()
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Batch Time (μs): mean={:>6} p50={:>6} p95={:>6} p99={:>6} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        if !failures.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Failed Requests:                                             ║");
            for (kind, count) in &failures {
                info!("║   {:14}: {:>6}                                     ║", kind, count);
            }
        }
        info!(
            "╚══════════════════════════════════════════════════════════════╝ uptime {:.1}s",
            self.start_time.elapsed().as_secs_f64()
        );
    }
}

impl Default for ScoringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ScoringMetrics::new();

        metrics.record_batch(Duration::from_micros(100), 3, 2);
        metrics.record_batch(Duration::from_micros(300), 1, 0);
        metrics.record_failure("schema");
        metrics.record_failure("schema");
        metrics.record_failure("ingest");

        assert_eq!(metrics.batches_scored.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.rows_scored.load(Ordering::Relaxed), 4);
        assert_eq!(metrics.get_fraud_rate(), 50.0);
        assert_eq!(metrics.get_failures()["schema"], 2);
        assert_eq!(metrics.get_failures()["ingest"], 1);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ScoringMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);

        for us in [100, 200, 300, 400] {
            metrics.record_batch(Duration::from_micros(us), 1, 0);
        }
        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 400);
        assert_eq!(stats.p99_us, 400);
    }
}
