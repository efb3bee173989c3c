//! Device status and description types from the host contract

use serde::{Deserialize, Serialize};

/// RGBD sensor status reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    NotReady,
    OkStandby,
    OkInUse,
    GenericError,
    Timeout,
}

/// Physical bus the camera is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusType {
    Usb,
    Unknown,
}

/// Device description returned by the camera-description query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraDescription {
    /// Multi-line vendor information dump
    pub device_description: String,

    /// Bus the device is connected through
    pub bus_type: BusType,
}
