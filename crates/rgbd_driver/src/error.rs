//! Driver error types

use camera_client::BackendError;
use camera_client::StreamFormat;
use contracts::CameraFeature;
use thiserror::Error;

/// Driver-specific error
#[derive(Debug, Error)]
pub enum DriverError {
    /// Wrapped backend error
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Vendor pixel format with no host pixel code
    #[error("pixel format {format:?} not recognized")]
    InvalidPixelFormat { format: StreamFormat },

    /// Frame and destination buffer sizes disagree
    #[error("device and local copy data size don't match: frame is {frame_bytes} bytes, destination expects {expected_bytes}")]
    BufferSizeMismatch {
        frame_bytes: usize,
        expected_bytes: usize,
    },

    /// Expected frame missing from the frameset
    #[error("no {stream} frame in the frameset")]
    MissingFrame { stream: &'static str },

    /// Feature outside the supported set
    #[error("feature {feature:?} not supported")]
    FeatureUnsupported { feature: CameraFeature },

    /// Feature declared but without a vendor option behind it
    #[error("feature {feature:?} is not implemented")]
    FeatureNotImplemented { feature: CameraFeature },

    /// Feature has no on/off toggle
    #[error("feature {feature:?} does not have on/off mode")]
    FeatureNoOnOff { feature: CameraFeature },

    /// Feature has no auto/manual toggle
    #[error("feature {feature:?} does not have both auto and manual modes")]
    FeatureNoAutoMode { feature: CameraFeature },

    /// Mode argument outside auto/manual
    #[error("cannot set feature {feature:?} to an unknown mode")]
    UnknownMode { feature: CameraFeature },

    /// Two-valued feature access
    #[error("no 2-valued features are supported")]
    TwoValuedUnsupported,

    /// Stubbed operation
    #[error("{operation} is not supported")]
    OperationUnsupported { operation: &'static str },
}

/// Result alias
pub type Result<T> = std::result::Result<T, DriverError>;
