//! SDK-seam data types
//!
//! Everything the driver and a backend exchange: stream declarations,
//! negotiated profiles, raw frames and sensor options. Pixel payloads use
//! `bytes::Bytes` so framesets can be passed around without copying.

use bytes::Bytes;
use contracts::Intrinsics;

/// Data stream of the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Color,
    Depth,
}

/// Vendor pixel format of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamFormat {
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
    Y8,
    Y16,
    Z16,
    Disparity16,
    Raw8,
    Raw16,
    /// Motion/confidence formats the driver never requests
    Other,
}

impl StreamFormat {
    /// Storage size of one pixel in bytes, zero for unhandled formats
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            StreamFormat::Raw8 | StreamFormat::Y8 => 1,
            StreamFormat::Z16 | StreamFormat::Disparity16 | StreamFormat::Y16
            | StreamFormat::Raw16 => 2,
            StreamFormat::Rgb8 | StreamFormat::Bgr8 => 3,
            StreamFormat::Rgba8 | StreamFormat::Bgra8 => 4,
            StreamFormat::Other => 0,
        }
    }
}

/// One stream declaration: resolution, format and frame rate (0 = any)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub width: u32,
    pub height: u32,
    pub format: StreamFormat,
    pub framerate: u32,
}

/// The full stream negotiation request
///
/// Both streams are always declared together: the negotiation object is
/// shared and a partial declaration would silently drop the other stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub color: StreamRequest,
    pub depth: StreamRequest,
}

impl StreamConfig {
    /// Standard declaration: RGB8 color plus Z16 depth, any frame rate
    pub fn with_resolutions(color: (u32, u32), depth: (u32, u32)) -> Self {
        Self {
            color: StreamRequest {
                width: color.0,
                height: color.1,
                format: StreamFormat::Rgb8,
                framerate: 0,
            },
            depth: StreamRequest {
                width: depth.0,
                height: depth.1,
                format: StreamFormat::Z16,
                framerate: 0,
            },
        }
    }
}

/// Role of a physical sensor on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Depth,
    Color,
}

/// Discovered sensor, addressed by role from then on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorHandle {
    pub name: String,
    pub kind: SensorKind,
}

/// The device's sensors, classified once at discovery
///
/// Tagged pair instead of raw indices into the device's sensor list, so
/// the driver never aliases borrowed sensor pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSet {
    pub depth: SensorHandle,
    pub color: SensorHandle,
}

/// Vendor sensor option identifiers used by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorOption {
    Exposure,
    Gain,
    WhiteBalance,
    Sharpness,
    Hue,
    Saturation,
    EnableAutoExposure,
    EnableAutoWhiteBalance,
    Accuracy,
    MinDistance,
    MaxDistance,
    DepthUnits,
}

/// Negotiated profile of one active stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamProfile {
    pub stream: StreamKind,
    pub format: StreamFormat,
    pub intrinsics: Intrinsics,
}

/// Raw video frame from the pipeline
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub format: StreamFormat,
    pub data: Bytes,
}

impl VideoFrame {
    /// Total byte size of the pixel payload
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Raw depth frame from the pipeline
///
/// Depth values are little-endian u16 in sensor units; multiply by
/// `depth_units` for meters.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub width: u32,
    pub height: u32,
    pub format: StreamFormat,
    pub depth_units: f32,
    pub data: Bytes,
}

impl DepthFrame {
    /// Metric distance at pixel (x, y) in meters, zero when out of bounds
    pub fn distance(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 2;
        if idx + 1 >= self.data.len() {
            return 0.0;
        }
        let raw = u16::from_le_bytes([self.data[idx], self.data[idx + 1]]);
        raw as f32 * self.depth_units
    }
}

/// One blocking wait's worth of frames
#[derive(Debug, Clone, Default)]
pub struct FrameSet {
    pub color: Option<VideoFrame>,
    pub depth: Option<DepthFrame>,
}

/// Vendor device information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub serial_number: String,
    pub firmware_version: String,
    pub product_line: String,
    pub usb_type: String,
}

impl DeviceInfo {
    /// Multi-line dump in the shape the host description query expects
    pub fn description(&self) -> String {
        format!(
            "Device information:\n  \
             Name                 : {}\n  \
             Serial Number        : {}\n  \
             Firmware Version     : {}\n  \
             Product Line         : {}\n  \
             Usb Type Descriptor  : {}",
            self.name, self.serial_number, self.firmware_version, self.product_line, self.usb_type
        )
    }
}
