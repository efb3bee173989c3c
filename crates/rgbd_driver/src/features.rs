//! Camera feature capability table
//!
//! One descriptor per supported feature instead of parallel switch
//! statements: the vendor option behind the value, the option behind the
//! auto toggle, and the mode capabilities.
//!
//! All supported features live on the color sensor; the depth sensor's
//! options are reached through the dedicated accuracy/clip-plane surface.

use camera_client::SensorOption;
use contracts::CameraFeature;

/// Capability descriptor of one supported feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureCaps {
    /// Vendor option carrying the feature value; `None` for features that
    /// are declared but not implemented (frame rate)
    pub option: Option<SensorOption>,

    /// Vendor option toggling automatic control, when one exists
    pub auto_option: Option<SensorOption>,

    /// Feature can be switched on/off through the auto toggle
    pub has_on_off: bool,

    /// Feature accepts manually set values
    pub has_manual: bool,
}

impl FeatureCaps {
    /// Whether the feature has an automatic mode
    pub fn has_auto(&self) -> bool {
        self.auto_option.is_some()
    }
}

/// Look up the capability descriptor of a feature
///
/// `None` marks the feature as unsupported by this device.
pub fn feature_caps(feature: CameraFeature) -> Option<FeatureCaps> {
    match feature {
        CameraFeature::Exposure => Some(FeatureCaps {
            option: Some(SensorOption::Exposure),
            auto_option: Some(SensorOption::EnableAutoExposure),
            has_on_off: true,
            has_manual: true,
        }),
        CameraFeature::WhiteBalance => Some(FeatureCaps {
            option: Some(SensorOption::WhiteBalance),
            auto_option: Some(SensorOption::EnableAutoWhiteBalance),
            has_on_off: true,
            has_manual: false,
        }),
        CameraFeature::Gain => Some(FeatureCaps {
            option: Some(SensorOption::Gain),
            auto_option: None,
            has_on_off: false,
            has_manual: true,
        }),
        // Declared supported, but no vendor option is wired up yet
        CameraFeature::FrameRate => Some(FeatureCaps {
            option: None,
            auto_option: None,
            has_on_off: false,
            has_manual: true,
        }),
        CameraFeature::Sharpness => Some(FeatureCaps {
            option: Some(SensorOption::Sharpness),
            auto_option: None,
            has_on_off: false,
            has_manual: true,
        }),
        CameraFeature::Hue => Some(FeatureCaps {
            option: Some(SensorOption::Hue),
            auto_option: None,
            has_on_off: false,
            has_manual: true,
        }),
        CameraFeature::Saturation => Some(FeatureCaps {
            option: Some(SensorOption::Saturation),
            auto_option: None,
            has_on_off: false,
            has_manual: true,
        }),
        _ => None,
    }
}
