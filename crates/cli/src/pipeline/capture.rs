//! The blocking capture loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use camera_client::CameraBackend;
use contracts::{ColorImage, DepthImage, DriverConfig};
use observability::CaptureMetricsAggregator;
use rgbd_driver::RgbdDriver;
use tracing::{debug, info, warn};

use crate::error::CliError;
use crate::pipeline::CaptureStats;

/// Options for one capture loop run
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub driver_config: DriverConfig,
    pub max_frames: Option<u64>,
    pub timeout: Option<Duration>,
    pub use_mock: bool,
}

/// Open the driver and capture framesets until stopped
///
/// Runs on a worker thread; the caller flips `stop` to end the loop.
pub fn run_capture_loop(
    options: CaptureOptions,
    stop: Arc<AtomicBool>,
) -> Result<CaptureStats, CliError> {
    #[cfg(feature = "real-realsense")]
    {
        if !options.use_mock {
            let backend = camera_client::RealSenseBackend::new()
                .map_err(|e| CliError::driver_open(e.to_string()))?;
            return capture_with(backend, options, stop);
        }
    }

    #[cfg(not(feature = "real-realsense"))]
    if !options.use_mock {
        warn!("built without real-realsense support, using the mock backend");
    }

    capture_with(camera_client::MockBackend::new(), options, stop)
}

fn capture_with<B: CameraBackend>(
    backend: B,
    options: CaptureOptions,
    stop: Arc<AtomicBool>,
) -> Result<CaptureStats, CliError> {
    let mut driver = RgbdDriver::new(backend);
    driver
        .open(&options.driver_config)
        .map_err(|e| CliError::driver_open(e.to_string()))?;

    let period = Duration::from_millis(driver.period_ms() as u64);
    let mut aggregator = CaptureMetricsAggregator::new();
    let mut color = ColorImage::new();
    let mut depth = DepthImage::new();
    let mut frames = 0u64;
    let mut failures = 0u64;
    let started = Instant::now();

    info!(period_ms = driver.period_ms(), "capture loop running");

    while !stop.load(Ordering::Relaxed) {
        if let Some(max) = options.max_frames {
            if frames >= max {
                info!(frames, "frame budget reached");
                break;
            }
        }
        if let Some(timeout) = options.timeout {
            if started.elapsed() >= timeout {
                info!("capture timeout reached");
                break;
            }
        }

        let capture_started = Instant::now();
        match driver.images(&mut color, &mut depth) {
            Ok((color_stamp, depth_stamp)) => {
                frames += 1;
                aggregator.record_frame("rgbd", capture_started.elapsed().as_secs_f64() * 1000.0);
                debug!(
                    color_seq = color_stamp.seq,
                    depth_seq = depth_stamp.seq,
                    center_depth_m = depth.distance(depth.width() / 2, depth.height() / 2) as f64,
                    "frameset captured"
                );
            }
            Err(e) => {
                failures += 1;
                aggregator.record_failure("rgbd");
                warn!(error = %e, last_error = driver.last_error(), "capture failed");
            }
        }

        // Pace the loop to the configured period
        let elapsed = capture_started.elapsed();
        if elapsed < period {
            std::thread::sleep(period - elapsed);
        }
    }

    driver
        .close()
        .map_err(|e| CliError::capture_loop(format!("close failed: {e}")))?;

    Ok(CaptureStats {
        frames_captured: frames,
        failures,
        duration: started.elapsed(),
        metrics: aggregator.summary(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_loop_frame_budget() {
        let options = CaptureOptions {
            driver_config: DriverConfig {
                period: 1,
                ..Default::default()
            },
            max_frames: Some(3),
            timeout: None,
            use_mock: true,
        };
        let stats = run_capture_loop(options, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(stats.frames_captured, 3);
        assert_eq!(stats.failures, 0);
        assert_eq!(stats.metrics.total_frames, 3);
    }

    #[test]
    fn test_capture_loop_stop_flag() {
        let options = CaptureOptions {
            driver_config: DriverConfig {
                period: 1,
                ..Default::default()
            },
            max_frames: None,
            timeout: None,
            use_mock: true,
        };
        // Pre-set stop: the loop opens, captures nothing and exits
        let stats = run_capture_loop(options, Arc::new(AtomicBool::new(true))).unwrap();
        assert_eq!(stats.frames_captured, 0);
    }

    #[test]
    fn test_capture_loop_timeout() {
        let options = CaptureOptions {
            driver_config: DriverConfig {
                period: 1,
                ..Default::default()
            },
            max_frames: None,
            timeout: Some(Duration::from_millis(50)),
            use_mock: true,
        };
        let stats = run_capture_loop(options, Arc::new(AtomicBool::new(false))).unwrap();
        assert!(stats.duration >= Duration::from_millis(50));
    }
}
