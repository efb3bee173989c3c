//! # Integration Tests
//!
//! Cross-crate tests: configuration through driver against the mock
//! backend, covering the contract the host relies on.

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        // Sanity: contracts crate types are reachable
        let _ = contracts::SensorStatus::OkInUse;
    }
}

#[cfg(test)]
mod e2e_tests {
    use camera_client::{MockBackend, MockConfig, SensorOption, StreamFormat};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{CameraFeature, ColorImage, DepthImage, FeatureMode, SensorStatus};
    use rgbd_driver::RgbdDriver;

    const CONFIG_TOML: &str = r#"
period = 33
accuracy = 1.0
clip_planes = [0.25, 9.0]
depth_resolution = [640, 480]
rgb_resolution = [640, 480]
device_wait_timeout_ms = 2000
"#;

    fn open_from_toml(toml: &str) -> RgbdDriver<MockBackend> {
        let config = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        let mut driver = RgbdDriver::new(MockBackend::new());
        driver.open(&config).unwrap();
        driver
    }

    /// Full path: TOML -> DriverConfig -> open -> capture -> close
    #[test]
    fn test_e2e_open_capture_close() {
        let mut driver = open_from_toml(CONFIG_TOML);
        assert_eq!(driver.sensor_status(), SensorStatus::OkInUse);
        assert_eq!(driver.period_ms(), 33);

        // The warm-up discarded exactly 30 framesets before discovery
        assert_eq!(driver.backend().wait_call_count(), 30);

        let mut color = ColorImage::new();
        let mut depth = DepthImage::new();
        let (cs, ds) = driver.images(&mut color, &mut depth).unwrap();

        assert_eq!(color.width(), 640);
        assert_eq!(color.height(), 480);
        assert_eq!(depth.width(), 640);
        assert!(depth.distance(320, 240) > 0.0);
        assert_eq!(cs.seq, 1);
        assert_eq!(ds.seq, 1);

        // Configured overrides reached the depth sensor
        assert_eq!(driver.depth_clip_planes().unwrap(), (0.25, 9.0));
        assert_eq!(driver.depth_accuracy(), 1.0);

        driver.close().unwrap();
    }

    /// Consecutive captures strictly increase each stream's stamp
    #[test]
    fn test_e2e_stamps_strictly_increase() {
        let mut driver = open_from_toml(CONFIG_TOML);
        let mut color = ColorImage::new();
        let mut depth = DepthImage::new();

        let mut last_color = 0;
        let mut last_depth = 0;
        for _ in 0..5 {
            let (cs, ds) = driver.images(&mut color, &mut depth).unwrap();
            assert!(cs.seq > last_color);
            assert!(ds.seq > last_depth);
            last_color = cs.seq;
            last_depth = ds.seq;
        }
    }

    /// Resolution changes re-negotiate one stream and preserve the other
    #[test]
    fn test_e2e_resolution_change_preserves_other_stream() {
        let mut driver = open_from_toml(CONFIG_TOML);

        driver.set_depth_resolution(848, 480).unwrap();
        assert_eq!(driver.depth_resolution(), (848, 480));
        assert_eq!(driver.rgb_resolution(), (640, 480));

        driver.set_rgb_resolution(1280, 720).unwrap();
        assert_eq!(driver.rgb_resolution(), (1280, 720));
        assert_eq!(driver.depth_resolution(), (848, 480));

        // Captures keep working against the new negotiation
        let mut color = ColorImage::new();
        driver.rgb_image(&mut color).unwrap();
        assert_eq!((color.width(), color.height()), (1280, 720));
    }

    /// Feature surface: support set, dispatch and mode transitions
    #[test]
    fn test_e2e_feature_surface() {
        let mut driver = open_from_toml(CONFIG_TOML);

        // Fixed supported set through the raw-identifier entry point
        for feature in [
            CameraFeature::Exposure,
            CameraFeature::WhiteBalance,
            CameraFeature::Gain,
            CameraFeature::FrameRate,
            CameraFeature::Sharpness,
            CameraFeature::Hue,
            CameraFeature::Saturation,
        ] {
            assert!(driver.has_feature_id(feature as i32), "{feature:?}");
        }
        assert!(!driver.has_feature_id(CameraFeature::Brightness as i32));
        assert!(!driver.has_feature_id(42));

        // Value dispatch lands on the color sensor
        driver.set_feature(CameraFeature::Saturation, 70.0).unwrap();
        assert_eq!(driver.feature(CameraFeature::Saturation).unwrap(), 70.0);

        // Auto/manual only exists for white balance and exposure
        driver
            .set_mode(CameraFeature::WhiteBalance, FeatureMode::Auto)
            .unwrap();
        assert_eq!(
            driver.mode(CameraFeature::WhiteBalance).unwrap(),
            FeatureMode::Auto
        );

        let before = driver.backend().option_write_count();
        assert!(driver
            .set_mode(CameraFeature::Sharpness, FeatureMode::Auto)
            .is_err());
        assert_eq!(driver.backend().option_write_count(), before);

        // One-push approximation writes auto then manual
        driver.set_one_push(CameraFeature::Exposure).unwrap();
        let writes = driver.backend().option_writes();
        let tail: Vec<_> = writes[writes.len() - 2..]
            .iter()
            .map(|(_, option, value)| (*option, *value))
            .collect();
        assert_eq!(
            tail,
            vec![
                (SensorOption::EnableAutoExposure, 1.0),
                (SensorOption::EnableAutoExposure, 0.0)
            ]
        );
    }

    /// Capture hard-fails on frames that do not fit the negotiation
    #[test]
    fn test_e2e_capture_failures_are_clean() {
        let config = ConfigLoader::load_from_str(CONFIG_TOML, ConfigFormat::Toml).unwrap();

        // Unknown vendor pixel format
        let backend = MockBackend::with_config(MockConfig {
            color_format_override: Some(StreamFormat::Other),
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        driver.open(&config).unwrap();
        let mut color = ColorImage::new();
        assert!(driver.rgb_image(&mut color).is_err());
        assert!(!driver.last_error().is_empty());

        // Frame size disagreeing with the negotiated resolution
        let backend = MockBackend::with_config(MockConfig {
            color_dims_override: Some((320, 240)),
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        driver.open(&config).unwrap();
        let mut color = ColorImage::new();
        assert!(driver.rgb_image(&mut color).is_err());
        // Destination stays untouched
        assert_eq!(color.byte_len(), 0);
    }

    /// Bounded device wait fails open; hot-plug lets it proceed
    #[test]
    fn test_e2e_device_wait_paths() {
        let config = ConfigLoader::load_from_str(CONFIG_TOML, ConfigFormat::Toml).unwrap();

        let backend = MockBackend::with_config(MockConfig {
            device_present: false,
            hotplug_connects: false,
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        assert!(driver.open(&config).is_err());

        let backend = MockBackend::with_config(MockConfig {
            device_present: false,
            hotplug_connects: true,
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        driver.open(&config).unwrap();
        assert_eq!(driver.sensor_status(), SensorStatus::OkInUse);
    }

    /// Close succeeds even when the backend stop fails
    #[test]
    fn test_e2e_close_best_effort() {
        let config = ConfigLoader::load_from_str(CONFIG_TOML, ConfigFormat::Toml).unwrap();
        let backend = MockBackend::with_config(MockConfig {
            fail_stop: true,
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        driver.open(&config).unwrap();
        assert!(driver.close().is_ok());
    }

    /// Aggregated capture metrics line up with driver results
    #[test]
    fn test_e2e_metrics_aggregation() {
        let mut driver = open_from_toml(CONFIG_TOML);
        let mut aggregator = observability::CaptureMetricsAggregator::new();

        let mut color = ColorImage::new();
        let mut depth = DepthImage::new();
        for _ in 0..4 {
            let started = std::time::Instant::now();
            driver.images(&mut color, &mut depth).unwrap();
            aggregator.record_frame("rgbd", started.elapsed().as_secs_f64() * 1000.0);
        }

        let summary = aggregator.summary();
        assert_eq!(summary.total_frames, 4);
        assert_eq!(summary.total_failures, 0);
        assert_eq!(summary.latency_ms.count, 4);
    }
}
