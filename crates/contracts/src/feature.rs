//! Camera feature identifiers
//!
//! The host addresses controllable camera properties by numeric feature
//! identifier. The enumeration mirrors the host contract; which features a
//! driver actually supports is the driver's decision.

use serde::{Deserialize, Serialize};

/// Controllable camera property identifiers from the host contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum CameraFeature {
    Brightness = 0,
    Exposure = 1,
    Sharpness = 2,
    WhiteBalance = 3,
    Hue = 4,
    Saturation = 5,
    Gamma = 6,
    Shutter = 7,
    Gain = 8,
    Iris = 9,
    Focus = 10,
    FrameRate = 11,
    Zoom = 12,
    Pan = 13,
    Tilt = 14,
    Mirror = 15,
}

impl CameraFeature {
    /// All identifiers known to the host contract
    pub const ALL: [CameraFeature; 16] = [
        CameraFeature::Brightness,
        CameraFeature::Exposure,
        CameraFeature::Sharpness,
        CameraFeature::WhiteBalance,
        CameraFeature::Hue,
        CameraFeature::Saturation,
        CameraFeature::Gamma,
        CameraFeature::Shutter,
        CameraFeature::Gain,
        CameraFeature::Iris,
        CameraFeature::Focus,
        CameraFeature::FrameRate,
        CameraFeature::Zoom,
        CameraFeature::Pan,
        CameraFeature::Tilt,
        CameraFeature::Mirror,
    ];
}

impl TryFrom<i32> for CameraFeature {
    type Error = i32;

    /// Map a raw host identifier into the enumeration
    ///
    /// Returns the raw value back as the error for out-of-range ids.
    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| *f as i32 == raw)
            .ok_or(raw)
    }
}

/// Auto/manual control mode of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureMode {
    Auto,
    Manual,
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_round_trip() {
        for feature in CameraFeature::ALL {
            assert_eq!(CameraFeature::try_from(feature as i32), Ok(feature));
        }
    }

    #[test]
    fn test_try_from_out_of_range() {
        assert_eq!(CameraFeature::try_from(-1), Err(-1));
        assert_eq!(CameraFeature::try_from(99), Err(99));
    }
}
