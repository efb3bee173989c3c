//! # Camera Client
//!
//! Vendor-SDK boundary module.
//!
//! Responsibilities:
//! - Define the [`CameraBackend`] trait the driver is generic over
//! - Own the SDK-seam data types (streams, frames, sensor options)
//! - Provide the real RealSense implementation and a Mock backend
//!
//! ## Feature Flags
//!
//! - `real-realsense`: Enable the real RealSense backend (requires
//!   librealsense2)

pub mod client;
pub mod error;
pub mod mock_client;
pub mod types;

#[cfg(feature = "real-realsense")]
pub mod realsense_client;

pub use client::CameraBackend;
pub use error::{BackendError, Result};
pub use mock_client::{MockBackend, MockConfig};
pub use types::{
    DepthFrame, DeviceInfo, FrameSet, SensorHandle, SensorKind, SensorOption, SensorSet,
    StreamConfig, StreamFormat, StreamKind, StreamProfile, StreamRequest, VideoFrame,
};

#[cfg(feature = "real-realsense")]
pub use realsense_client::RealSenseBackend;
