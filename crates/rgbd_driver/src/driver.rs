//! RGBD camera driver core
//!
//! Owns the backend for its lifetime and implements the host device
//! contract: lifecycle, capture, parameter surface and feature surface.
//! Single-threaded and blocking; the host serializes all calls.

use std::time::{Duration, Instant};

use camera_client::{
    CameraBackend, SensorKind, SensorOption, SensorSet, StreamConfig, StreamKind,
};
use contracts::{
    identity_transform, BusType, CameraDescription, CameraFeature, ColorImage, DepthImage,
    DriverConfig, Extrinsics, FeatureMode, IntrinsicParam, Intrinsics, SensorStatus, Stamp,
    TransformMatrix,
};
use metrics::{counter, histogram};
use tracing::{debug, error, info, instrument, warn};

use crate::convert;
use crate::error::{DriverError, Result};
use crate::features::{feature_caps, FeatureCaps};

/// Framesets discarded at open while auto-exposure/AWB stabilize
const WARMUP_FRAMES: u32 = 30;

/// RGBD camera driver
///
/// Generic over the backend so the same driver runs against the real
/// RealSense backend and the mock.
pub struct RgbdDriver<B: CameraBackend> {
    backend: B,
    period: u32,
    verbose: bool,
    registered: bool,
    transformation: TransformMatrix,
    stream_config: StreamConfig,
    sensors: Option<SensorSet>,
    color_intrin: Intrinsics,
    depth_intrin: Intrinsics,
    depth_to_color: Extrinsics,
    color_to_depth: Extrinsics,
    rgb_stamp: Stamp,
    depth_stamp: Stamp,
    last_error: String,
    status: SensorStatus,
}

impl<B: CameraBackend> RgbdDriver<B> {
    /// Create a closed driver around a backend
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            period: 30,
            verbose: false,
            registered: true,
            transformation: identity_transform(),
            stream_config: StreamConfig::with_resolutions((640, 480), (640, 480)),
            sensors: None,
            color_intrin: Intrinsics::default(),
            depth_intrin: Intrinsics::default(),
            depth_to_color: Extrinsics::default(),
            color_to_depth: Extrinsics::default(),
            rgb_stamp: Stamp::new(),
            depth_stamp: Stamp::new(),
            last_error: String::new(),
            status: SensorStatus::NotReady,
        }
    }

    // ===== Lifecycle =====

    /// Open the device with the supplied configuration
    #[instrument(name = "rgbd_driver_open", skip(self, config))]
    pub fn open(&mut self, config: &DriverConfig) -> Result<()> {
        self.period = config.period;
        self.verbose = config.verbose;
        self.registered = config.registered;
        self.transformation = config
            .transformation_matrix
            .unwrap_or_else(identity_transform);
        if !self.registered {
            debug!("depth-to-color registration display disabled");
        }

        self.stream_config = StreamConfig::with_resolutions(
            (config.rgb_resolution[0], config.rgb_resolution[1]),
            (config.depth_resolution[0], config.depth_resolution[1]),
        );
        self.backend.apply_stream_config(&self.stream_config)?;
        self.backend.start_pipeline()?;

        // Camera warm-up - dropped frames to allow stabilization
        info!("sensor warm-up....");
        for _ in 0..WARMUP_FRAMES {
            self.backend.wait_for_frames()?;
        }
        info!("....device ready");

        if !self.backend.device_present()? {
            error!("no device connected, please connect a RealSense device");
            let timeout = config.device_wait_timeout_ms.map(Duration::from_millis);
            self.backend.wait_for_device(timeout)?;
        }

        if self.verbose {
            let device = self.backend.device_info()?;
            info!("{}", device.description());
        }

        let sensors = self.backend.query_sensors()?;
        info!(
            depth = %sensors.depth.name,
            color = %sensors.color.name,
            "device sensors classified"
        );
        if self.verbose {
            self.dump_sensor_options(&sensors);
        }
        self.sensors = Some(sensors);

        self.update_transformations()?;

        self.apply_param_overrides(config)?;
        self.status = SensorStatus::OkInUse;
        Ok(())
    }

    /// Stop the pipeline; best-effort, always succeeds
    #[instrument(name = "rgbd_driver_close", skip(self))]
    pub fn close(&mut self) -> Result<()> {
        if let Err(e) = self.backend.stop_pipeline() {
            warn!(error = %e, "failed to stop the pipeline during close");
        }
        Ok(())
    }

    fn dump_sensor_options(&self, sensors: &SensorSet) {
        for handle in [&sensors.depth, &sensors.color] {
            match self.backend.supported_options(handle.kind) {
                Ok(options) => {
                    info!(sensor = %handle.name, "supported options:");
                    for (option, value) in options {
                        info!("  {option:?}: {value}");
                    }
                }
                Err(e) => warn!(sensor = %handle.name, error = %e, "option dump failed"),
            }
        }
    }

    /// Re-read the active profiles after a (re)negotiation
    ///
    /// All four values are fetched before any is recorded, so a failed
    /// query leaves the previous transformations intact.
    fn update_transformations(&mut self) -> Result<()> {
        let depth = self.backend.stream_profile(StreamKind::Depth)?;
        let color = self.backend.stream_profile(StreamKind::Color)?;
        let depth_to_color = self
            .backend
            .extrinsics(StreamKind::Depth, StreamKind::Color)?;
        let color_to_depth = self
            .backend
            .extrinsics(StreamKind::Color, StreamKind::Depth)?;

        self.depth_intrin = depth.intrinsics;
        self.color_intrin = color.intrinsics;
        self.depth_to_color = depth_to_color;
        self.color_to_depth = color_to_depth;
        Ok(())
    }

    fn apply_param_overrides(&mut self, config: &DriverConfig) -> Result<()> {
        if let Some(accuracy) = config.accuracy {
            self.set_depth_accuracy(accuracy)
                .map_err(|e| self.setting_error("accuracy", e))?;
        }
        if let Some([near, far]) = config.clip_planes {
            self.set_depth_clip_planes(near, far)
                .map_err(|e| self.setting_error("clip_planes", e))?;
        }
        Ok(())
    }

    fn setting_error(&mut self, param: &str, e: DriverError) -> DriverError {
        error!(param, error = %e, "setting param failed... quitting");
        self.last_error = e.to_string();
        e
    }

    // ===== Capture =====

    /// Capture the next color image
    pub fn rgb_image(&mut self, image: &mut ColorImage) -> Result<Stamp> {
        let started = Instant::now();
        let result = self.capture_rgb(image);
        self.finish_capture("color", started, result)
    }

    /// Capture the next depth image, aligned into the color viewpoint
    pub fn depth_image(&mut self, image: &mut DepthImage) -> Result<Stamp> {
        let started = Instant::now();
        let result = self.capture_depth(image);
        self.finish_capture("depth", started, result)
    }

    /// Capture one frameset and convert both images from it
    pub fn images(
        &mut self,
        color: &mut ColorImage,
        depth: &mut DepthImage,
    ) -> Result<(Stamp, Stamp)> {
        let started = Instant::now();
        let result = self.capture_both(color, depth);
        self.finish_capture("rgbd", started, result)
    }

    fn capture_rgb(&mut self, image: &mut ColorImage) -> Result<Stamp> {
        let frames = self.backend.wait_for_frames()?;
        let frame = frames.color.ok_or(DriverError::MissingFrame { stream: "color" })?;
        convert::fill_color_image(&frame, &self.color_intrin, image)?;
        self.rgb_stamp.update();
        Ok(self.rgb_stamp)
    }

    fn capture_depth(&mut self, image: &mut DepthImage) -> Result<Stamp> {
        let frames = self.backend.wait_for_frames()?;
        let aligned = self.backend.align_to_color(frames)?;
        let frame = aligned.depth.ok_or(DriverError::MissingFrame { stream: "depth" })?;
        convert::fill_depth_image(&frame, image)?;
        self.depth_stamp.update();
        Ok(self.depth_stamp)
    }

    fn capture_both(
        &mut self,
        color: &mut ColorImage,
        depth: &mut DepthImage,
    ) -> Result<(Stamp, Stamp)> {
        let frames = self.backend.wait_for_frames()?;
        let aligned = self.backend.align_to_color(frames)?;

        let color_frame = aligned
            .color
            .ok_or(DriverError::MissingFrame { stream: "color" })?;
        let depth_frame = aligned
            .depth
            .ok_or(DriverError::MissingFrame { stream: "depth" })?;

        convert::fill_color_image(&color_frame, &self.color_intrin, color)?;
        convert::fill_depth_image(&depth_frame, depth)?;

        self.rgb_stamp.update();
        self.depth_stamp.update();
        Ok((self.rgb_stamp, self.depth_stamp))
    }

    fn finish_capture<T>(
        &mut self,
        stream: &'static str,
        started: Instant,
        result: Result<T>,
    ) -> Result<T> {
        match &result {
            Ok(_) => {
                counter!("rgbd_cam_frames_total", "stream" => stream).increment(1);
                histogram!("rgbd_cam_capture_latency_ms")
                    .record(started.elapsed().as_secs_f64() * 1000.0);
            }
            Err(e) => {
                counter!("rgbd_cam_capture_failures_total", "stream" => stream).increment(1);
                self.last_error = e.to_string();
            }
        }
        result
    }

    // ===== Resolution / geometry surface =====

    pub fn rgb_width(&self) -> u32 {
        self.color_intrin.width
    }

    pub fn rgb_height(&self) -> u32 {
        self.color_intrin.height
    }

    pub fn depth_width(&self) -> u32 {
        self.depth_intrin.width
    }

    pub fn depth_height(&self) -> u32 {
        self.depth_intrin.height
    }

    pub fn rgb_resolution(&self) -> (u32, u32) {
        (self.color_intrin.width, self.color_intrin.height)
    }

    pub fn depth_resolution(&self) -> (u32, u32) {
        (self.depth_intrin.width, self.depth_intrin.height)
    }

    /// Change the depth stream resolution
    ///
    /// Re-declares both streams, cycles the pipeline and re-reads the
    /// profiles. Failure aborts the change and keeps the previous
    /// declaration.
    #[instrument(name = "rgbd_driver_set_depth_resolution", skip(self))]
    pub fn set_depth_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        let previous = self.stream_config;
        self.stream_config.depth.width = width;
        self.stream_config.depth.height = height;
        self.reconfigure_streams(previous)
    }

    /// Change the color stream resolution
    #[instrument(name = "rgbd_driver_set_rgb_resolution", skip(self))]
    pub fn set_rgb_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        let previous = self.stream_config;
        self.stream_config.color.width = width;
        self.stream_config.color.height = height;
        self.reconfigure_streams(previous)
    }

    fn reconfigure_streams(&mut self, previous: StreamConfig) -> Result<()> {
        // Both streams are re-declared together: the negotiation object is
        // shared and a partial declaration would drop the other stream.
        let result = self
            .backend
            .apply_stream_config(&self.stream_config)
            .map_err(DriverError::from)
            .and_then(|_| self.backend.stop_pipeline().map_err(DriverError::from))
            .and_then(|_| self.backend.start_pipeline().map_err(DriverError::from))
            .and_then(|_| self.update_transformations());

        if let Err(ref e) = result {
            error!(error = %e, "stream reconfiguration failed");
            self.last_error = e.to_string();
            self.stream_config = previous;
        }
        result
    }

    /// Horizontal/vertical color field of view in degrees
    pub fn rgb_fov(&self) -> (f64, f64) {
        self.color_intrin.fov()
    }

    /// Horizontal/vertical depth field of view in degrees
    pub fn depth_fov(&self) -> (f64, f64) {
        self.depth_intrin.fov()
    }

    pub fn set_rgb_fov(&mut self, _horizontal: f64, _vertical: f64) -> Result<()> {
        self.unsupported("rgb fov setting")
    }

    pub fn set_depth_fov(&mut self, _horizontal: f64, _vertical: f64) -> Result<()> {
        self.unsupported("depth fov setting")
    }

    pub fn rgb_mirroring(&self) -> Result<bool> {
        self.unsupported("mirroring")
    }

    pub fn set_rgb_mirroring(&mut self, _mirror: bool) -> Result<()> {
        self.unsupported("mirroring")
    }

    pub fn depth_mirroring(&self) -> Result<bool> {
        self.unsupported("mirroring")
    }

    pub fn set_depth_mirroring(&mut self, _mirror: bool) -> Result<()> {
        self.unsupported("mirroring")
    }

    /// Enumerating supported stream configurations is not wired up yet
    pub fn rgb_supported_configurations(&self) -> Result<Vec<(u32, u32)>> {
        self.unsupported("supported configuration enumeration")
    }

    fn unsupported<T>(&self, operation: &'static str) -> Result<T> {
        warn!("{operation} not supported");
        Err(DriverError::OperationUnsupported { operation })
    }

    /// Color intrinsics rendered as the host property map
    pub fn rgb_intrinsic_param(&self) -> IntrinsicParam {
        IntrinsicParam::from_intrinsics(&self.color_intrin, self.rgb_stamp.time)
    }

    /// Depth intrinsics rendered as the host property map
    pub fn depth_intrinsic_param(&self) -> IntrinsicParam {
        IntrinsicParam::from_intrinsics(&self.depth_intrin, self.depth_stamp.time)
    }

    /// Externally calibrated depth-to-color transform, identity by default
    pub fn extrinsic_param(&self) -> TransformMatrix {
        self.transformation
    }

    /// Rigid transform from the depth to the color reference frame
    pub fn depth_to_color_extrinsics(&self) -> Extrinsics {
        self.depth_to_color
    }

    /// Rigid transform from the color to the depth reference frame
    pub fn color_to_depth_extrinsics(&self) -> Extrinsics {
        self.color_to_depth
    }

    /// The sensors discovered at open, when the driver is open
    pub fn sensor_set(&self) -> Option<&SensorSet> {
        self.sensors.as_ref()
    }

    // ===== Depth accuracy / clip planes =====

    /// Depth accuracy option value, zero when the query fails
    pub fn depth_accuracy(&self) -> f64 {
        match self.backend.option(SensorKind::Depth, SensorOption::Accuracy) {
            Ok(value) => value as f64,
            Err(e) => {
                warn!(error = %e, "accuracy query failed");
                0.0
            }
        }
    }

    pub fn set_depth_accuracy(&mut self, accuracy: f64) -> Result<()> {
        self.backend
            .set_option(SensorKind::Depth, SensorOption::Accuracy, accuracy as f32)?;
        Ok(())
    }

    pub fn depth_clip_planes(&self) -> Result<(f64, f64)> {
        let near = self
            .backend
            .option(SensorKind::Depth, SensorOption::MinDistance)?;
        let far = self
            .backend
            .option(SensorKind::Depth, SensorOption::MaxDistance)?;
        Ok((near as f64, far as f64))
    }

    pub fn set_depth_clip_planes(&mut self, near: f64, far: f64) -> Result<()> {
        self.backend
            .set_option(SensorKind::Depth, SensorOption::MinDistance, near as f32)?;
        self.backend
            .set_option(SensorKind::Depth, SensorOption::MaxDistance, far as f32)?;
        Ok(())
    }

    // ===== Status / description =====

    pub fn sensor_status(&self) -> SensorStatus {
        self.status
    }

    /// Most recent recorded failure message, empty when none
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    pub fn period_ms(&self) -> u32 {
        self.period
    }

    pub fn camera_description(&self) -> Result<CameraDescription> {
        let device = self.backend.device_info()?;
        Ok(CameraDescription {
            device_description: device.description(),
            bus_type: BusType::Usb,
        })
    }

    // ===== Feature surface =====

    /// Whether the feature identifier is in the fixed supported set
    pub fn has_feature(&self, feature: CameraFeature) -> bool {
        feature_caps(feature).is_some()
    }

    /// Raw-identifier variant of `has_feature` for the host ABI
    pub fn has_feature_id(&self, raw: i32) -> bool {
        CameraFeature::try_from(raw)
            .map(|f| self.has_feature(f))
            .unwrap_or(false)
    }

    fn require_caps(&self, feature: CameraFeature) -> Result<FeatureCaps> {
        feature_caps(feature).ok_or_else(|| {
            error!(?feature, "feature not supported");
            DriverError::FeatureUnsupported { feature }
        })
    }

    /// Set a feature value on the color sensor
    pub fn set_feature(&mut self, feature: CameraFeature, value: f64) -> Result<()> {
        let caps = self.require_caps(feature)?;
        let option = caps.option.ok_or_else(|| {
            warn!(?feature, "feature declared but not implemented");
            DriverError::FeatureNotImplemented { feature }
        })?;
        self.backend
            .set_option(SensorKind::Color, option, value as f32)?;
        Ok(())
    }

    /// Read a feature value from the color sensor
    pub fn feature(&self, feature: CameraFeature) -> Result<f64> {
        let caps = self.require_caps(feature)?;
        let option = caps.option.ok_or_else(|| {
            warn!(?feature, "feature declared but not implemented");
            DriverError::FeatureNotImplemented { feature }
        })?;
        let value = self.backend.option(SensorKind::Color, option)?;
        Ok(value as f64)
    }

    pub fn set_feature_pair(
        &mut self,
        _feature: CameraFeature,
        _value1: f64,
        _value2: f64,
    ) -> Result<()> {
        error!("no 2-valued features are supported");
        Err(DriverError::TwoValuedUnsupported)
    }

    pub fn feature_pair(&self, _feature: CameraFeature) -> Result<(f64, f64)> {
        error!("no 2-valued features are supported");
        Err(DriverError::TwoValuedUnsupported)
    }

    pub fn has_on_off(&self, feature: CameraFeature) -> Result<bool> {
        Ok(self.require_caps(feature)?.has_on_off)
    }

    pub fn has_auto(&self, feature: CameraFeature) -> Result<bool> {
        Ok(self.require_caps(feature)?.has_auto())
    }

    pub fn has_manual(&self, feature: CameraFeature) -> Result<bool> {
        Ok(self.require_caps(feature)?.has_manual)
    }

    pub fn has_one_push(&self, feature: CameraFeature) -> Result<bool> {
        self.has_auto(feature)
    }

    /// Enable or disable a feature's automatic control
    pub fn set_active(&mut self, feature: CameraFeature, on: bool) -> Result<()> {
        let caps = self.require_caps(feature)?;
        if !caps.has_on_off {
            error!(?feature, "feature does not have on/off mode");
            return Err(DriverError::FeatureNoOnOff { feature });
        }
        let auto = caps
            .auto_option
            .ok_or(DriverError::FeatureNoOnOff { feature })?;
        self.backend
            .set_option(SensorKind::Color, auto, if on { 1.0 } else { 0.0 })?;
        Ok(())
    }

    /// Whether a feature's automatic control is currently enabled
    pub fn active(&self, feature: CameraFeature) -> Result<bool> {
        let caps = self.require_caps(feature)?;
        if !caps.has_on_off {
            error!(?feature, "feature does not have on/off mode");
            return Err(DriverError::FeatureNoOnOff { feature });
        }
        let auto = caps
            .auto_option
            .ok_or(DriverError::FeatureNoOnOff { feature })?;
        let value = self.backend.option(SensorKind::Color, auto)?;
        Ok(value != 0.0)
    }

    /// Switch a feature between auto and manual control
    pub fn set_mode(&mut self, feature: CameraFeature, mode: FeatureMode) -> Result<()> {
        let caps = self.require_caps(feature)?;
        let auto = caps.auto_option.ok_or_else(|| {
            error!(?feature, "feature does not have both auto and manual mode");
            DriverError::FeatureNoAutoMode { feature }
        })?;
        let value = match mode {
            FeatureMode::Auto => 1.0,
            FeatureMode::Manual => 0.0,
            FeatureMode::Unknown => return Err(DriverError::UnknownMode { feature }),
        };
        self.backend.set_option(SensorKind::Color, auto, value)?;
        Ok(())
    }

    /// Current auto/manual mode of a feature
    ///
    /// Any readback other than 0.0 or 1.0 reports `Unknown`.
    pub fn mode(&self, feature: CameraFeature) -> Result<FeatureMode> {
        let caps = self.require_caps(feature)?;
        let auto = caps.auto_option.ok_or_else(|| {
            error!(?feature, "feature does not have both auto and manual mode");
            DriverError::FeatureNoAutoMode { feature }
        })?;
        let value = self.backend.option(SensorKind::Color, auto)?;
        Ok(match value {
            v if v == 0.0 => FeatureMode::Manual,
            v if v == 1.0 => FeatureMode::Auto,
            _ => FeatureMode::Unknown,
        })
    }

    /// One-shot calibration approximation: auto, then straight back to
    /// manual. No convergence verification.
    pub fn set_one_push(&mut self, feature: CameraFeature) -> Result<()> {
        if !self.has_one_push(feature)? {
            error!(?feature, "feature does not have one-push");
            return Err(DriverError::FeatureNoAutoMode { feature });
        }
        self.set_mode(feature, FeatureMode::Auto)?;
        self.set_mode(feature, FeatureMode::Manual)?;
        Ok(())
    }

    /// Access the backend, mainly for tests and diagnostics
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera_client::{MockBackend, MockConfig, StreamFormat};

    fn open_driver(config: DriverConfig) -> RgbdDriver<MockBackend> {
        let mut driver = RgbdDriver::new(MockBackend::new());
        driver.open(&config).unwrap();
        driver
    }

    #[test]
    fn test_open_discards_warmup_frames() {
        let driver = open_driver(DriverConfig::default());
        assert_eq!(driver.backend().wait_call_count(), 30);
        assert_eq!(driver.sensor_status(), SensorStatus::OkInUse);
    }

    #[test]
    fn test_open_fails_on_pipeline_start() {
        let backend = MockBackend::with_config(MockConfig {
            fail_start: true,
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        assert!(driver.open(&DriverConfig::default()).is_err());
        assert_eq!(driver.sensor_status(), SensorStatus::NotReady);
    }

    #[test]
    fn test_open_applies_overrides() {
        let config = DriverConfig {
            accuracy: Some(1.0),
            clip_planes: Some([0.3, 6.0]),
            ..Default::default()
        };
        let driver = open_driver(config);

        let writes = driver.backend().option_writes();
        assert_eq!(
            writes,
            vec![
                (SensorKind::Depth, SensorOption::Accuracy, 1.0),
                (SensorKind::Depth, SensorOption::MinDistance, 0.3),
                (SensorKind::Depth, SensorOption::MaxDistance, 6.0),
            ]
        );
        assert_eq!(driver.depth_clip_planes().unwrap(), (0.3, 6.0));
    }

    #[test]
    fn test_open_override_failure_aborts() {
        let backend = MockBackend::with_config(MockConfig {
            fail_options: vec![SensorOption::MinDistance],
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        let config = DriverConfig {
            clip_planes: Some([0.3, 6.0]),
            ..Default::default()
        };
        assert!(driver.open(&config).is_err());
        assert!(!driver.last_error().is_empty());
    }

    #[test]
    fn test_close_is_best_effort() {
        let backend = MockBackend::with_config(MockConfig {
            fail_stop: true,
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        driver.open(&DriverConfig::default()).unwrap();
        assert!(driver.close().is_ok());
    }

    #[test]
    fn test_device_wait_bounded_timeout() {
        let backend = MockBackend::with_config(MockConfig {
            device_present: false,
            hotplug_connects: false,
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        let config = DriverConfig {
            device_wait_timeout_ms: Some(100),
            ..Default::default()
        };
        assert!(driver.open(&config).is_err());
    }

    #[test]
    fn test_device_hotplug_proceeds() {
        let backend = MockBackend::with_config(MockConfig {
            device_present: false,
            hotplug_connects: true,
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        driver.open(&DriverConfig::default()).unwrap();
        assert_eq!(driver.sensor_status(), SensorStatus::OkInUse);
    }

    #[test]
    fn test_capture_advances_stamp_strictly() {
        let mut driver = open_driver(DriverConfig::default());
        let mut image = ColorImage::new();

        let first = driver.rgb_image(&mut image).unwrap();
        let second = driver.rgb_image(&mut image).unwrap();
        assert!(second.seq > first.seq);

        let mut depth = DepthImage::new();
        let d1 = driver.depth_image(&mut depth).unwrap();
        let d2 = driver.depth_image(&mut depth).unwrap();
        assert!(d2.seq > d1.seq);
    }

    #[test]
    fn test_capture_images_pair() {
        let mut driver = open_driver(DriverConfig::default());
        let mut color = ColorImage::new();
        let mut depth = DepthImage::new();

        let (cs, ds) = driver.images(&mut color, &mut depth).unwrap();
        assert_eq!(cs.seq, 1);
        assert_eq!(ds.seq, 1);
        assert_eq!(color.width(), 640);
        // Aligned depth is expressed at the color resolution
        assert_eq!(depth.width(), 640);
        assert!((depth.distance(10, 10) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_capture_unknown_format_fails() {
        let backend = MockBackend::with_config(MockConfig {
            color_format_override: Some(StreamFormat::Other),
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        driver.open(&DriverConfig::default()).unwrap();

        let mut image = ColorImage::new();
        let result = driver.rgb_image(&mut image);
        assert!(matches!(
            result,
            Err(DriverError::InvalidPixelFormat { .. })
        ));
        assert!(!driver.last_error().is_empty());
    }

    #[test]
    fn test_capture_size_mismatch_keeps_stamp_and_buffer() {
        let backend = MockBackend::with_config(MockConfig {
            color_dims_override: Some((320, 240)),
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        driver.open(&DriverConfig::default()).unwrap();

        let mut image = ColorImage::new();
        let result = driver.rgb_image(&mut image);
        assert!(matches!(
            result,
            Err(DriverError::BufferSizeMismatch { .. })
        ));
        // Destination buffer untouched by the failed capture
        assert_eq!(image.byte_len(), 0);
    }

    #[test]
    fn test_set_depth_resolution_keeps_color() {
        let mut driver = open_driver(DriverConfig::default());
        driver.set_depth_resolution(848, 480).unwrap();

        assert_eq!(driver.depth_resolution(), (848, 480));
        assert_eq!(driver.rgb_resolution(), (640, 480));
    }

    #[test]
    fn test_set_rgb_resolution_keeps_depth() {
        let mut driver = open_driver(DriverConfig::default());
        driver.set_rgb_resolution(1280, 720).unwrap();

        assert_eq!(driver.rgb_resolution(), (1280, 720));
        assert_eq!(driver.depth_resolution(), (640, 480));
    }

    #[test]
    fn test_failed_resolution_change_restores_declaration() {
        let backend = MockBackend::with_config(MockConfig {
            fail_stop: true,
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        driver.open(&DriverConfig::default()).unwrap();

        assert!(driver.set_depth_resolution(848, 480).is_err());
        // Recorded intrinsics and the driver's declaration are unchanged
        assert_eq!(driver.depth_resolution(), (640, 480));
        assert!(!driver.last_error().is_empty());
    }

    #[test]
    fn test_fov_and_mirroring_surface() {
        let mut driver = open_driver(DriverConfig::default());
        let (h, v) = driver.rgb_fov();
        assert!(h > 0.0 && v > 0.0);

        assert!(driver.set_rgb_fov(60.0, 45.0).is_err());
        assert!(driver.set_depth_fov(60.0, 45.0).is_err());
        assert!(driver.rgb_mirroring().is_err());
        assert!(driver.set_depth_mirroring(true).is_err());
        assert!(driver.rgb_supported_configurations().is_err());
    }

    #[test]
    fn test_intrinsic_params_render_plumb_bob() {
        let driver = open_driver(DriverConfig::default());
        let param = driver.rgb_intrinsic_param();
        assert_eq!(param.distortion_model, "plumb_bob");
        assert_eq!(param.focal_length_x, 640.0);
    }

    #[test]
    fn test_extrinsic_param_defaults_to_identity() {
        let driver = open_driver(DriverConfig::default());
        assert_eq!(driver.extrinsic_param(), identity_transform());
    }

    #[test]
    fn test_sensor_discovery_recorded() {
        let driver = open_driver(DriverConfig::default());
        let sensors = driver.sensor_set().unwrap();
        assert_eq!(sensors.depth.kind, SensorKind::Depth);
        assert_eq!(sensors.color.kind, SensorKind::Color);

        // Stereo baseline is symmetric between the two stream frames
        let d2c = driver.depth_to_color_extrinsics();
        let c2d = driver.color_to_depth_extrinsics();
        assert!((d2c.translation[0] + c2d.translation[0]).abs() < 1e-6);
    }

    #[test]
    fn test_feature_support_set() {
        let driver = open_driver(DriverConfig::default());
        assert!(driver.has_feature(CameraFeature::Exposure));
        assert!(driver.has_feature(CameraFeature::FrameRate));
        assert!(!driver.has_feature(CameraFeature::Brightness));
        assert!(!driver.has_feature(CameraFeature::Mirror));
        assert!(driver.has_feature_id(CameraFeature::Gain as i32));
        assert!(!driver.has_feature_id(-3));
        assert!(!driver.has_feature_id(1000));
    }

    #[test]
    fn test_feature_set_get_round_trip() {
        let mut driver = open_driver(DriverConfig::default());
        driver.set_feature(CameraFeature::Gain, 32.0).unwrap();
        assert_eq!(driver.feature(CameraFeature::Gain).unwrap(), 32.0);
    }

    #[test]
    fn test_unsupported_feature_never_touches_sensor() {
        let mut driver = open_driver(DriverConfig::default());
        let writes_before = driver.backend().option_write_count();

        assert!(driver.set_feature(CameraFeature::Gamma, 1.0).is_err());
        assert!(driver.feature(CameraFeature::Zoom).is_err());
        assert!(driver.set_mode(CameraFeature::Pan, FeatureMode::Auto).is_err());
        assert_eq!(driver.backend().option_write_count(), writes_before);
    }

    #[test]
    fn test_frame_rate_declared_but_unimplemented() {
        let mut driver = open_driver(DriverConfig::default());
        assert!(matches!(
            driver.set_feature(CameraFeature::FrameRate, 30.0),
            Err(DriverError::FeatureNotImplemented { .. })
        ));
        assert!(matches!(
            driver.feature(CameraFeature::FrameRate),
            Err(DriverError::FeatureNotImplemented { .. })
        ));
    }

    #[test]
    fn test_two_valued_features_always_fail() {
        let mut driver = open_driver(DriverConfig::default());
        assert!(driver
            .set_feature_pair(CameraFeature::Exposure, 1.0, 2.0)
            .is_err());
        assert!(driver.feature_pair(CameraFeature::Exposure).is_err());
    }

    #[test]
    fn test_mode_round_trip_for_auto_features() {
        let mut driver = open_driver(DriverConfig::default());
        for feature in [CameraFeature::WhiteBalance, CameraFeature::Exposure] {
            driver.set_mode(feature, FeatureMode::Auto).unwrap();
            assert_eq!(driver.mode(feature).unwrap(), FeatureMode::Auto);
            driver.set_mode(feature, FeatureMode::Manual).unwrap();
            assert_eq!(driver.mode(feature).unwrap(), FeatureMode::Manual);
        }
    }

    #[test]
    fn test_mode_rejected_for_manual_only_features() {
        let mut driver = open_driver(DriverConfig::default());
        let writes_before = driver.backend().option_write_count();
        assert!(matches!(
            driver.set_mode(CameraFeature::Gain, FeatureMode::Auto),
            Err(DriverError::FeatureNoAutoMode { .. })
        ));
        assert_eq!(driver.backend().option_write_count(), writes_before);
    }

    #[test]
    fn test_set_mode_unknown_rejected() {
        let mut driver = open_driver(DriverConfig::default());
        assert!(matches!(
            driver.set_mode(CameraFeature::Exposure, FeatureMode::Unknown),
            Err(DriverError::UnknownMode { .. })
        ));
    }

    #[test]
    fn test_active_translates_to_auto_option() {
        let mut driver = open_driver(DriverConfig::default());
        driver.set_active(CameraFeature::Exposure, false).unwrap();
        assert!(!driver.active(CameraFeature::Exposure).unwrap());
        driver.set_active(CameraFeature::WhiteBalance, true).unwrap();
        assert!(driver.active(CameraFeature::WhiteBalance).unwrap());

        assert!(matches!(
            driver.set_active(CameraFeature::Gain, true),
            Err(DriverError::FeatureNoOnOff { .. })
        ));
    }

    #[test]
    fn test_one_push_toggles_auto_then_manual() {
        let mut driver = open_driver(DriverConfig::default());
        let before = driver.backend().option_write_count();
        driver.set_one_push(CameraFeature::WhiteBalance).unwrap();

        let writes = driver.backend().option_writes();
        let tail = writes[before..].to_vec();
        assert_eq!(
            tail,
            vec![
                (
                    SensorKind::Color,
                    SensorOption::EnableAutoWhiteBalance,
                    1.0
                ),
                (
                    SensorKind::Color,
                    SensorOption::EnableAutoWhiteBalance,
                    0.0
                ),
            ]
        );

        assert!(driver.set_one_push(CameraFeature::Gain).is_err());
    }

    #[test]
    fn test_camera_description_reports_usb() {
        let driver = open_driver(DriverConfig::default());
        let desc = driver.camera_description().unwrap();
        assert_eq!(desc.bus_type, BusType::Usb);
        assert!(desc.device_description.contains("Mock RealSense"));
    }

    #[test]
    fn test_depth_accuracy_zero_on_failure() {
        let backend = MockBackend::with_config(MockConfig {
            fail_options: vec![SensorOption::Accuracy],
            ..Default::default()
        });
        let mut driver = RgbdDriver::new(backend);
        driver.open(&DriverConfig::default()).unwrap();
        assert_eq!(driver.depth_accuracy(), 0.0);
    }
}
