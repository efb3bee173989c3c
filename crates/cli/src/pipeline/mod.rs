//! Capture loop orchestration.

mod capture;
mod stats;

pub use capture::{run_capture_loop, CaptureOptions};
pub use stats::CaptureStats;
