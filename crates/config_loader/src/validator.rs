//! Configuration validation
//!
//! Validation rules:
//! - period > 0
//! - stream resolutions non-zero
//! - accuracy > 0 when set
//! - clip_planes: 0 <= near < far
//! - device_wait_timeout_ms > 0 when set

use contracts::{ContractError, DriverConfig};

/// Validate a DriverConfig
///
/// Returns the first encountered error, or Ok(()).
pub fn validate(config: &DriverConfig) -> Result<(), ContractError> {
    validate_period(config)?;
    validate_resolutions(config)?;
    validate_accuracy(config)?;
    validate_clip_planes(config)?;
    validate_device_wait(config)?;
    Ok(())
}

fn validate_period(config: &DriverConfig) -> Result<(), ContractError> {
    if config.period == 0 {
        return Err(ContractError::config_validation(
            "period",
            "period must be > 0 milliseconds",
        ));
    }
    Ok(())
}

fn validate_resolutions(config: &DriverConfig) -> Result<(), ContractError> {
    for (field, [width, height]) in [
        ("depth_resolution", config.depth_resolution),
        ("rgb_resolution", config.rgb_resolution),
    ] {
        if width == 0 || height == 0 {
            return Err(ContractError::config_validation(
                field,
                format!("resolution must be non-zero, got {width}x{height}"),
            ));
        }
    }
    Ok(())
}

fn validate_accuracy(config: &DriverConfig) -> Result<(), ContractError> {
    if let Some(accuracy) = config.accuracy {
        if accuracy <= 0.0 {
            return Err(ContractError::config_validation(
                "accuracy",
                format!("accuracy must be > 0, got {accuracy}"),
            ));
        }
    }
    Ok(())
}

fn validate_clip_planes(config: &DriverConfig) -> Result<(), ContractError> {
    if let Some([near, far]) = config.clip_planes {
        if near < 0.0 {
            return Err(ContractError::config_validation(
                "clip_planes",
                format!("near plane must be >= 0, got {near}"),
            ));
        }
        if near >= far {
            return Err(ContractError::config_validation(
                "clip_planes",
                format!("near plane ({near}) must be < far plane ({far})"),
            ));
        }
    }
    Ok(())
}

fn validate_device_wait(config: &DriverConfig) -> Result<(), ContractError> {
    if config.device_wait_timeout_ms == Some(0) {
        return Err(ContractError::config_validation(
            "device_wait_timeout_ms",
            "timeout must be > 0 when set; omit the key to wait indefinitely",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = DriverConfig::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_period() {
        let config = DriverConfig {
            period: 0,
            ..Default::default()
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("period"), "got: {err}");
    }

    #[test]
    fn test_zero_resolution() {
        let config = DriverConfig {
            rgb_resolution: [0, 480],
            ..Default::default()
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("rgb_resolution"), "got: {err}");
    }

    #[test]
    fn test_negative_accuracy() {
        let config = DriverConfig {
            accuracy: Some(-1.0),
            ..Default::default()
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("accuracy"), "got: {err}");
    }

    #[test]
    fn test_inverted_clip_planes() {
        let config = DriverConfig {
            clip_planes: Some([5.0, 1.0]),
            ..Default::default()
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("near plane"), "got: {err}");
    }

    #[test]
    fn test_negative_near_plane() {
        let config = DriverConfig {
            clip_planes: Some([-0.5, 1.0]),
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_device_wait() {
        let config = DriverConfig {
            device_wait_timeout_ms: Some(0),
            ..Default::default()
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("device_wait_timeout_ms"), "got: {err}");
    }
}
