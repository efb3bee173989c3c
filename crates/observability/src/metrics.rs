//! Capture metrics aggregation
//!
//! In-memory aggregation of capture results for run summaries. The driver
//! itself exports Prometheus counters; this aggregator backs the CLI's
//! end-of-run report.

use std::collections::HashMap;

/// Capture metrics aggregator
///
/// Aggregates per-stream capture counts and latency statistics in memory.
#[derive(Debug, Clone, Default)]
pub struct CaptureMetricsAggregator {
    /// Successful captures per stream
    pub frames: HashMap<String, u64>,

    /// Failed captures per stream
    pub failures: HashMap<String, u64>,

    /// Capture latency statistics (milliseconds)
    pub latency_stats: RunningStats,
}

impl CaptureMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful capture with its latency
    pub fn record_frame(&mut self, stream: &str, latency_ms: f64) {
        *self.frames.entry(stream.to_string()).or_insert(0) += 1;
        self.latency_stats.push(latency_ms);
    }

    /// Record a failed capture
    pub fn record_failure(&mut self, stream: &str) {
        *self.failures.entry(stream.to_string()).or_insert(0) += 1;
    }

    /// Total successful captures across streams
    pub fn total_frames(&self) -> u64 {
        self.frames.values().sum()
    }

    /// Total failed captures across streams
    pub fn total_failures(&self) -> u64 {
        self.failures.values().sum()
    }

    /// Produce a summary report
    pub fn summary(&self) -> MetricsSummary {
        let total_frames = self.total_frames();
        let total_failures = self.total_failures();
        let attempts = total_frames + total_failures;

        MetricsSummary {
            total_frames,
            total_failures,
            failure_rate: if attempts > 0 {
                total_failures as f64 / attempts as f64 * 100.0
            } else {
                0.0
            },
            frames_per_stream: self.frames.clone(),
            latency_ms: StatsSummary::from(&self.latency_stats),
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub total_failures: u64,
    pub failure_rate: f64,
    pub frames_per_stream: HashMap<String, u64>,
    pub latency_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Capture Metrics Summary ===")?;
        writeln!(f, "Total frames: {}", self.total_frames)?;
        writeln!(
            f,
            "Failed captures: {} ({:.2}%)",
            self.total_failures, self.failure_rate
        )?;
        writeln!(f, "Capture latency (ms): {}", self.latency_ms)?;

        if !self.frames_per_stream.is_empty() {
            writeln!(f, "Frames per stream:")?;
            for (stream, count) in &self.frames_per_stream {
                writeln!(f, "  {}: {}", stream, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Running mean
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats_basic() {
        let mut stats = RunningStats::default();
        for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.push(value);
        }
        assert_eq!(stats.count(), 8);
        assert_eq!(stats.min(), 2.0);
        assert_eq!(stats.max(), 9.0);
        assert!((stats.mean() - 5.0).abs() < 1e-9);
        // Sample std dev of this classic sequence
        assert!((stats.std_dev() - 2.138).abs() < 0.01);
    }

    #[test]
    fn test_aggregator_summary() {
        let mut aggregator = CaptureMetricsAggregator::new();
        aggregator.record_frame("color", 10.0);
        aggregator.record_frame("color", 20.0);
        aggregator.record_frame("depth", 15.0);
        aggregator.record_failure("color");

        let summary = aggregator.summary();
        assert_eq!(summary.total_frames, 3);
        assert_eq!(summary.total_failures, 1);
        assert!((summary.failure_rate - 25.0).abs() < 1e-9);
        assert_eq!(summary.frames_per_stream.get("color"), Some(&2));
        assert_eq!(summary.latency_ms.count, 3);
    }

    #[test]
    fn test_aggregator_reset() {
        let mut aggregator = CaptureMetricsAggregator::new();
        aggregator.record_frame("color", 5.0);
        aggregator.reset();
        assert_eq!(aggregator.total_frames(), 0);
    }
}
