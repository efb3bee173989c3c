//! # RGBD Driver
//!
//! The camera adapter: exposes a RealSense depth/RGB camera as an
//! RGBD-sensor device to the middleware host.
//!
//! Responsibilities:
//! - Own one backend (pipeline/device) handle for the driver lifetime
//! - Negotiate stream formats at open, re-negotiate on resolution changes
//! - Convert vendor frames into host image types with per-stream stamps
//! - Map the host camera-feature surface onto vendor sensor options
//!
//! ## Feature Flags
//!
//! - `real-realsense`: forward to `camera_client`'s real backend

pub mod convert;
pub mod driver;
pub mod error;
pub mod features;

pub use camera_client::{CameraBackend, MockBackend, MockConfig};
pub use driver::RgbdDriver;
pub use error::{DriverError, Result};
pub use features::{feature_caps, FeatureCaps};

#[cfg(feature = "real-realsense")]
pub use camera_client::RealSenseBackend;
