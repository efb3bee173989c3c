//! Camera backend error types

use thiserror::Error;

use crate::types::{SensorKind, SensorOption, StreamKind};

/// Backend-specific error
///
/// Every SDK fault is converted into one of these at the call site; no
/// vendor exception crosses the boundary.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No device connected
    #[error("no device available: {message}")]
    DeviceUnavailable { message: String },

    /// Bounded device wait elapsed without a hot-plug
    #[error("no device connected after waiting {waited_ms}ms")]
    DeviceWaitTimeout { waited_ms: u64 },

    /// Pipeline start error
    #[error("failed to start the pipeline: {message}")]
    PipelineStart { message: String },

    /// Pipeline stop error
    #[error("failed to stop the pipeline: {message}")]
    PipelineStop { message: String },

    /// Frame wait error
    #[error("failed to wait for frames: {message}")]
    FrameWait { message: String },

    /// Option not supported by the addressed sensor
    #[error("option {option:?} is not supported by the {sensor:?} sensor")]
    OptionUnsupported {
        sensor: SensorKind,
        option: SensorOption,
    },

    /// Option read/write error
    #[error("failed to access option {option:?}: {message}")]
    OptionAccess {
        option: SensorOption,
        message: String,
    },

    /// Active stream profile query error
    #[error("no active profile for {stream:?} stream: {message}")]
    StreamProfile { stream: StreamKind, message: String },

    /// Other SDK error
    #[error("sdk error: {message}")]
    Sdk { message: String },
}

impl BackendError {
    /// Create a generic SDK error from any vendor message
    pub fn sdk(message: impl Into<String>) -> Self {
        Self::Sdk {
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, BackendError>;
