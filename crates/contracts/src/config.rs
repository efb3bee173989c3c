//! DriverConfig - Config Loader output
//!
//! The configuration surface the host hands to the driver at open time.

use serde::{Deserialize, Serialize};

use crate::TransformMatrix;

/// Full driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Capture period in milliseconds
    #[serde(default = "default_period")]
    pub period: u32,

    /// Dump device information and supported sensor options at open
    #[serde(default)]
    pub verbose: bool,

    /// Hidden debug flag: disable the depth-to-color registration display.
    /// Does not affect the alignment pass performed during capture.
    #[serde(default = "default_registered")]
    pub registered: bool,

    /// Depth accuracy override, forwarded to the depth sensor at open
    #[serde(default)]
    pub accuracy: Option<f64>,

    /// Near/far clip planes in meters, forwarded to the depth sensor at open
    #[serde(default)]
    pub clip_planes: Option<[f64; 2]>,

    /// Requested depth stream resolution (width, height)
    #[serde(default = "default_resolution")]
    pub depth_resolution: [u32; 2],

    /// Requested color stream resolution (width, height)
    #[serde(default = "default_resolution")]
    pub rgb_resolution: [u32; 2],

    /// Bound on the wait for a device to be hot-plugged at open time.
    /// Absent means wait indefinitely.
    #[serde(default)]
    pub device_wait_timeout_ms: Option<u64>,

    /// Externally calibrated depth-to-color transform for the host
    /// extrinsic query. Identity when absent.
    #[serde(default)]
    pub transformation_matrix: Option<TransformMatrix>,
}

fn default_period() -> u32 {
    30
}

fn default_registered() -> bool {
    true
}

fn default_resolution() -> [u32; 2] {
    [640, 480]
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
            verbose: false,
            registered: default_registered(),
            accuracy: None,
            clip_planes: None,
            depth_resolution: default_resolution(),
            rgb_resolution: default_resolution(),
            device_wait_timeout_ms: None,
            transformation_matrix: None,
        }
    }
}
