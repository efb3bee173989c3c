//! Camera backend abstraction
//!
//! Defines the trait for interacting with the vendor SDK, supporting the
//! real implementation and mock testing.

use std::time::Duration;

use crate::error::Result;
use crate::types::{
    DeviceInfo, FrameSet, SensorKind, SensorOption, SensorSet, StreamConfig, StreamKind,
    StreamProfile,
};

/// Camera backend trait
///
/// Abstracts the vendor pipeline/device/sensor surface for testing and
/// implementation replacement. Supports a unified interface for the real
/// RealSense backend and the Mock backend.
///
/// All methods are synchronous and may block; implementations use interior
/// mutability so the driver can hold the backend by value.
pub trait CameraBackend: Send {
    /// Declare both stream configurations
    ///
    /// Always declares color and depth together; the negotiation object is
    /// shared and partial declarations would drop the other stream.
    fn apply_stream_config(&self, config: &StreamConfig) -> Result<()>;

    /// Start the pipeline with the declared streams
    fn start_pipeline(&self) -> Result<()>;

    /// Stop the pipeline
    fn stop_pipeline(&self) -> Result<()>;

    /// Block until the next frameset is available
    fn wait_for_frames(&self) -> Result<FrameSet>;

    /// Run the depth-to-color spatial alignment pass over a frameset
    ///
    /// The returned depth frame is expressed in the color stream's
    /// viewpoint and resolution; the color frame passes through untouched.
    fn align_to_color(&self, frames: FrameSet) -> Result<FrameSet>;

    /// Whether a device is currently enumerated
    fn device_present(&self) -> Result<bool>;

    /// Block until a device is hot-plugged
    ///
    /// `timeout = None` waits indefinitely (the historical behavior);
    /// bounded waits fail with `DeviceWaitTimeout` once elapsed.
    fn wait_for_device(&self, timeout: Option<Duration>) -> Result<()>;

    /// Vendor information of the enumerated device
    fn device_info(&self) -> Result<DeviceInfo>;

    /// Discover and classify the device's sensors
    ///
    /// Classification by capability query happens here, once; the driver
    /// addresses sensors only through the returned tagged pair.
    fn query_sensors(&self) -> Result<SensorSet>;

    /// Whether the addressed sensor supports an option
    fn supports_option(&self, sensor: SensorKind, option: SensorOption) -> Result<bool>;

    /// Read a sensor option
    fn option(&self, sensor: SensorKind, option: SensorOption) -> Result<f32>;

    /// Write a sensor option
    fn set_option(&self, sensor: SensorKind, option: SensorOption, value: f32) -> Result<()>;

    /// All supported options of a sensor with their current values
    ///
    /// Used for the verbose open-time dump.
    fn supported_options(&self, sensor: SensorKind) -> Result<Vec<(SensorOption, f32)>>;

    /// Negotiated profile of an active stream
    fn stream_profile(&self, stream: StreamKind) -> Result<StreamProfile>;

    /// Rigid transform between two active streams
    fn extrinsics(&self, from: StreamKind, to: StreamKind)
        -> Result<contracts::Extrinsics>;
}
