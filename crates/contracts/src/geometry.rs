//! Camera model parameters
//!
//! Per-stream intrinsics, the rigid transform between stream reference
//! frames, and the host-facing intrinsic property rendering.

use serde::{Deserialize, Serialize};

/// Plumb-bob distortion coefficients
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub t1: f64,
    pub t2: f64,
    pub k3: f64,
}

/// Per-stream camera model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    /// Negotiated stream width in pixels
    pub width: u32,

    /// Negotiated stream height in pixels
    pub height: u32,

    /// Focal length, x axis
    pub fx: f64,

    /// Focal length, y axis
    pub fy: f64,

    /// Principal point, x axis
    pub ppx: f64,

    /// Principal point, y axis
    pub ppy: f64,

    /// Lens distortion model coefficients
    pub distortion: Distortion,
}

impl Intrinsics {
    /// Horizontal and vertical field of view in degrees
    ///
    /// Same formula the vendor helper applies to its intrinsics struct.
    pub fn fov(&self) -> (f64, f64) {
        let h = 2.0 * (self.width as f64 / 2.0 / self.fx).atan().to_degrees();
        let v = 2.0 * (self.height as f64 / 2.0 / self.fy).atan().to_degrees();
        (h, v)
    }
}

/// Rigid transform between two stream reference frames
///
/// Row-major 3x3 rotation plus translation in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrinsics {
    pub rotation: [f32; 9],
    pub translation: [f32; 3],
}

impl Default for Extrinsics {
    fn default() -> Self {
        Self {
            rotation: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            translation: [0.0; 3],
        }
    }
}

impl Extrinsics {
    /// Apply the transform to a point in the source frame
    pub fn transform(&self, point: [f32; 3]) -> [f32; 3] {
        let r = &self.rotation;
        let t = &self.translation;
        [
            r[0] * point[0] + r[3] * point[1] + r[6] * point[2] + t[0],
            r[1] * point[0] + r[4] * point[1] + r[7] * point[2] + t[1],
            r[2] * point[0] + r[5] * point[1] + r[8] * point[2] + t[2],
        ]
    }
}

/// Intrinsics rendered as the host property map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrinsicParam {
    pub focal_length_x: f64,
    pub focal_length_y: f64,
    pub principal_point_x: f64,
    pub principal_point_y: f64,
    pub distortion_model: String,
    pub k1: f64,
    pub k2: f64,
    pub t1: f64,
    pub t2: f64,
    pub k3: f64,
    pub stamp: f64,
}

impl IntrinsicParam {
    /// Render intrinsics as the property map the host expects
    pub fn from_intrinsics(values: &Intrinsics, stamp: f64) -> Self {
        Self {
            focal_length_x: values.fx,
            focal_length_y: values.fy,
            principal_point_x: values.ppx,
            principal_point_y: values.ppy,
            distortion_model: "plumb_bob".to_string(),
            k1: values.distortion.k1,
            k2: values.distortion.k2,
            t1: values.distortion.t1,
            t2: values.distortion.t2,
            k3: values.distortion.k3,
            stamp,
        }
    }
}

/// Host-facing 4x4 rigid transform matrix, row-major
pub type TransformMatrix = [[f64; 4]; 4];

/// Identity transform
pub fn identity_transform() -> TransformMatrix {
    let mut m = [[0.0; 4]; 4];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    m
}
