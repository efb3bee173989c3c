//! Capture loop statistics.

use std::time::Duration;

use observability::MetricsSummary;

/// Statistics from a capture loop run
#[derive(Debug, Clone, Default)]
pub struct CaptureStats {
    /// Total framesets successfully captured
    pub frames_captured: u64,

    /// Total failed capture attempts
    pub failures: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Aggregated capture metrics
    pub metrics: MetricsSummary,
}

impl CaptureStats {
    /// Framesets per second throughput
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_captured as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Failure rate as percentage of attempts
    #[allow(dead_code)]
    pub fn failure_rate(&self) -> f64 {
        let total = self.frames_captured + self.failures;
        if total > 0 {
            (self.failures as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Capture Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Framesets: {}", self.frames_captured);
        println!("   ├─ Failures: {}", self.failures);
        println!("   └─ Throughput: {:.2} fps", self.fps());

        println!("\n{}", self.metrics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps() {
        let stats = CaptureStats {
            frames_captured: 60,
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        assert!((stats.fps() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_failure_rate() {
        let stats = CaptureStats {
            frames_captured: 3,
            failures: 1,
            ..Default::default()
        };
        assert!((stats.failure_rate() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_fps() {
        let stats = CaptureStats::default();
        assert_eq!(stats.fps(), 0.0);
    }
}
