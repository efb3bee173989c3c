//! Mock camera backend
//!
//! Mock implementation for unit tests, supporting failure-scenario
//! injection and inspection of every sensor option write.

use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use contracts::{Distortion, Extrinsics, Intrinsics};
use tracing::instrument;

use crate::client::CameraBackend;
use crate::error::{BackendError, Result};
use crate::types::{
    DepthFrame, DeviceInfo, FrameSet, SensorHandle, SensorKind, SensorOption, SensorSet,
    StreamConfig, StreamFormat, StreamKind, StreamProfile, VideoFrame,
};

/// Raw depth value every mock depth pixel carries (1.0m at 1mm units)
const MOCK_RAW_DEPTH: u16 = 1000;

/// Mock backend configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Device is enumerated from the start
    pub device_present: bool,
    /// A hot-plug arrives during `wait_for_device`
    pub hotplug_connects: bool,
    /// Fail pipeline start
    pub fail_start: bool,
    /// Fail pipeline stop
    pub fail_stop: bool,
    /// Fail frame waits
    pub fail_wait: bool,
    /// Options whose reads/writes should fail
    pub fail_options: Vec<SensorOption>,
    /// Produce color frames in this format instead of the negotiated one
    pub color_format_override: Option<StreamFormat>,
    /// Produce color frames with these dimensions instead of the
    /// negotiated ones (forces destination size mismatches)
    pub color_dims_override: Option<(u32, u32)>,
    /// Depth sensor scale in meters per unit
    pub depth_units: f32,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            device_present: true,
            hotplug_connects: true,
            fail_start: false,
            fail_stop: false,
            fail_wait: false,
            fail_options: Vec::new(),
            color_format_override: None,
            color_dims_override: None,
            depth_units: 0.001,
        }
    }
}

struct Inner {
    connected: bool,
    started: bool,
    stream_config: StreamConfig,
    depth_options: Vec<(SensorOption, f32)>,
    color_options: Vec<(SensorOption, f32)>,
    option_writes: Vec<(SensorKind, SensorOption, f32)>,
    wait_calls: u64,
}

/// Mock camera backend
pub struct MockBackend {
    config: MockConfig,
    inner: Mutex<Inner>,
}

impl MockBackend {
    /// Create a default mock backend
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create a mock backend with an injected configuration
    pub fn with_config(config: MockConfig) -> Self {
        let inner = Inner {
            connected: config.device_present,
            started: false,
            stream_config: StreamConfig::with_resolutions((640, 480), (640, 480)),
            depth_options: vec![
                (SensorOption::Accuracy, 2.0),
                (SensorOption::MinDistance, 0.2),
                (SensorOption::MaxDistance, 10.0),
                (SensorOption::DepthUnits, config.depth_units),
            ],
            color_options: vec![
                (SensorOption::Exposure, 156.0),
                (SensorOption::Gain, 64.0),
                (SensorOption::WhiteBalance, 4600.0),
                (SensorOption::Sharpness, 50.0),
                (SensorOption::Hue, 0.0),
                (SensorOption::Saturation, 64.0),
                (SensorOption::EnableAutoExposure, 1.0),
                (SensorOption::EnableAutoWhiteBalance, 1.0),
            ],
            option_writes: Vec::new(),
            wait_calls: 0,
        };
        Self {
            config,
            inner: Mutex::new(inner),
        }
    }

    /// Number of framesets handed out so far
    pub fn wait_call_count(&self) -> u64 {
        self.inner.lock().unwrap().wait_calls
    }

    /// Every option write in arrival order
    pub fn option_writes(&self) -> Vec<(SensorKind, SensorOption, f32)> {
        self.inner.lock().unwrap().option_writes.clone()
    }

    /// Number of option writes so far
    pub fn option_write_count(&self) -> usize {
        self.inner.lock().unwrap().option_writes.len()
    }

    /// The currently declared stream configuration
    pub fn stream_config(&self) -> StreamConfig {
        self.inner.lock().unwrap().stream_config
    }

    /// Whether the pipeline is running
    pub fn is_started(&self) -> bool {
        self.inner.lock().unwrap().started
    }

    fn options_of(inner: &Inner, sensor: SensorKind) -> &Vec<(SensorOption, f32)> {
        match sensor {
            SensorKind::Depth => &inner.depth_options,
            SensorKind::Color => &inner.color_options,
        }
    }

    fn options_of_mut(inner: &mut Inner, sensor: SensorKind) -> &mut Vec<(SensorOption, f32)> {
        match sensor {
            SensorKind::Depth => &mut inner.depth_options,
            SensorKind::Color => &mut inner.color_options,
        }
    }

    fn synth_intrinsics(width: u32, height: u32) -> Intrinsics {
        Intrinsics {
            width,
            height,
            fx: width as f64,
            fy: width as f64,
            ppx: width as f64 / 2.0,
            ppy: height as f64 / 2.0,
            distortion: Distortion::default(),
        }
    }

    fn synth_depth_frame(&self, width: u32, height: u32) -> DepthFrame {
        let mut raw = Vec::with_capacity(width as usize * height as usize * 2);
        for _ in 0..(width as usize * height as usize) {
            raw.extend_from_slice(&MOCK_RAW_DEPTH.to_le_bytes());
        }
        DepthFrame {
            width,
            height,
            format: StreamFormat::Z16,
            depth_units: self.config.depth_units,
            data: Bytes::from(raw),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for MockBackend {
    fn apply_stream_config(&self, config: &StreamConfig) -> Result<()> {
        self.inner.lock().unwrap().stream_config = *config;
        Ok(())
    }

    #[instrument(name = "mock_start_pipeline", skip(self))]
    fn start_pipeline(&self) -> Result<()> {
        if self.config.fail_start {
            return Err(BackendError::PipelineStart {
                message: "mock failure".into(),
            });
        }
        self.inner.lock().unwrap().started = true;
        Ok(())
    }

    #[instrument(name = "mock_stop_pipeline", skip(self))]
    fn stop_pipeline(&self) -> Result<()> {
        if self.config.fail_stop {
            return Err(BackendError::PipelineStop {
                message: "mock failure".into(),
            });
        }
        self.inner.lock().unwrap().started = false;
        Ok(())
    }

    fn wait_for_frames(&self) -> Result<FrameSet> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.started {
            return Err(BackendError::FrameWait {
                message: "pipeline not started".into(),
            });
        }
        if self.config.fail_wait {
            return Err(BackendError::FrameWait {
                message: "mock failure".into(),
            });
        }
        inner.wait_calls += 1;

        let color_req = inner.stream_config.color;
        let depth_req = inner.stream_config.depth;
        drop(inner);

        let (cw, ch) = self
            .config
            .color_dims_override
            .unwrap_or((color_req.width, color_req.height));
        let format = self.config.color_format_override.unwrap_or(color_req.format);
        let color = VideoFrame {
            width: cw,
            height: ch,
            format,
            data: Bytes::from(vec![
                128u8;
                cw as usize * ch as usize * format.bytes_per_pixel().max(1)
            ]),
        };

        Ok(FrameSet {
            color: Some(color),
            depth: Some(self.synth_depth_frame(depth_req.width, depth_req.height)),
        })
    }

    fn align_to_color(&self, frames: FrameSet) -> Result<FrameSet> {
        // Aligned depth is expressed at the color stream's resolution
        let color_req = self.inner.lock().unwrap().stream_config.color;
        let depth = frames
            .depth
            .map(|_| self.synth_depth_frame(color_req.width, color_req.height));
        Ok(FrameSet {
            color: frames.color,
            depth,
        })
    }

    fn device_present(&self) -> Result<bool> {
        Ok(self.inner.lock().unwrap().connected)
    }

    #[instrument(name = "mock_wait_for_device", skip(self))]
    fn wait_for_device(&self, timeout: Option<Duration>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.connected {
            return Ok(());
        }
        if self.config.hotplug_connects {
            inner.connected = true;
            return Ok(());
        }
        match timeout {
            Some(t) => Err(BackendError::DeviceWaitTimeout {
                waited_ms: t.as_millis() as u64,
            }),
            // The real backend blocks forever here; the mock refuses to
            // hang the test suite.
            None => Err(BackendError::DeviceUnavailable {
                message: "mock never connects a device".into(),
            }),
        }
    }

    fn device_info(&self) -> Result<DeviceInfo> {
        if !self.inner.lock().unwrap().connected {
            return Err(BackendError::DeviceUnavailable {
                message: "not connected".into(),
            });
        }
        Ok(DeviceInfo {
            name: "Mock RealSense D435".into(),
            serial_number: "123456789".into(),
            firmware_version: "5.13.0.50".into(),
            product_line: "D400".into(),
            usb_type: "3.2".into(),
        })
    }

    fn query_sensors(&self) -> Result<SensorSet> {
        if !self.inner.lock().unwrap().connected {
            return Err(BackendError::DeviceUnavailable {
                message: "not connected".into(),
            });
        }
        Ok(SensorSet {
            depth: SensorHandle {
                name: "Stereo Module".into(),
                kind: SensorKind::Depth,
            },
            color: SensorHandle {
                name: "RGB Camera".into(),
                kind: SensorKind::Color,
            },
        })
    }

    fn supports_option(&self, sensor: SensorKind, option: SensorOption) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::options_of(&inner, sensor)
            .iter()
            .any(|(o, _)| *o == option))
    }

    fn option(&self, sensor: SensorKind, option: SensorOption) -> Result<f32> {
        if self.config.fail_options.contains(&option) {
            return Err(BackendError::OptionAccess {
                option,
                message: "mock failure".into(),
            });
        }
        let inner = self.inner.lock().unwrap();
        Self::options_of(&inner, sensor)
            .iter()
            .find(|(o, _)| *o == option)
            .map(|(_, v)| *v)
            .ok_or(BackendError::OptionUnsupported { sensor, option })
    }

    fn set_option(&self, sensor: SensorKind, option: SensorOption, value: f32) -> Result<()> {
        if self.config.fail_options.contains(&option) {
            return Err(BackendError::OptionAccess {
                option,
                message: "mock failure".into(),
            });
        }
        let mut inner = self.inner.lock().unwrap();
        let slot = Self::options_of_mut(&mut inner, sensor)
            .iter_mut()
            .find(|(o, _)| *o == option);
        match slot {
            Some((_, v)) => *v = value,
            None => return Err(BackendError::OptionUnsupported { sensor, option }),
        }
        inner.option_writes.push((sensor, option, value));
        Ok(())
    }

    fn supported_options(&self, sensor: SensorKind) -> Result<Vec<(SensorOption, f32)>> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::options_of(&inner, sensor).clone())
    }

    fn stream_profile(&self, stream: StreamKind) -> Result<StreamProfile> {
        let inner = self.inner.lock().unwrap();
        if !inner.started {
            return Err(BackendError::StreamProfile {
                stream,
                message: "pipeline not started".into(),
            });
        }
        let request = match stream {
            StreamKind::Color => inner.stream_config.color,
            StreamKind::Depth => inner.stream_config.depth,
        };
        Ok(StreamProfile {
            stream,
            format: request.format,
            intrinsics: Self::synth_intrinsics(request.width, request.height),
        })
    }

    fn extrinsics(&self, from: StreamKind, to: StreamKind) -> Result<Extrinsics> {
        // Nominal 15mm stereo baseline along x
        let x = match (from, to) {
            (StreamKind::Depth, StreamKind::Color) => 0.015,
            (StreamKind::Color, StreamKind::Depth) => -0.015,
            _ => 0.0,
        };
        Ok(Extrinsics {
            translation: [x, 0.0, 0.0],
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_then_wait_produces_frames() {
        let backend = MockBackend::new();
        backend.start_pipeline().unwrap();

        let frames = backend.wait_for_frames().unwrap();
        let color = frames.color.unwrap();
        assert_eq!(color.width, 640);
        assert_eq!(color.byte_len(), 640 * 480 * 3);
        let depth = frames.depth.unwrap();
        assert!((depth.distance(0, 0) - 1.0).abs() < 1e-6);
        assert_eq!(backend.wait_call_count(), 1);
    }

    #[test]
    fn test_wait_without_start_fails() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.wait_for_frames(),
            Err(BackendError::FrameWait { .. })
        ));
    }

    #[test]
    fn test_option_writes_are_recorded() {
        let backend = MockBackend::new();
        backend
            .set_option(SensorKind::Color, SensorOption::Gain, 32.0)
            .unwrap();

        assert_eq!(
            backend.option(SensorKind::Color, SensorOption::Gain).unwrap(),
            32.0
        );
        assert_eq!(
            backend.option_writes(),
            vec![(SensorKind::Color, SensorOption::Gain, 32.0)]
        );
    }

    #[test]
    fn test_unsupported_option_rejected_without_write() {
        let backend = MockBackend::new();
        let result = backend.set_option(SensorKind::Depth, SensorOption::Hue, 1.0);
        assert!(matches!(
            result,
            Err(BackendError::OptionUnsupported { .. })
        ));
        assert_eq!(backend.option_write_count(), 0);
    }

    #[test]
    fn test_hotplug_connects_on_wait() {
        let backend = MockBackend::with_config(MockConfig {
            device_present: false,
            hotplug_connects: true,
            ..Default::default()
        });
        assert!(!backend.device_present().unwrap());
        backend.wait_for_device(None).unwrap();
        assert!(backend.device_present().unwrap());
    }

    #[test]
    fn test_bounded_wait_times_out() {
        let backend = MockBackend::with_config(MockConfig {
            device_present: false,
            hotplug_connects: false,
            ..Default::default()
        });
        let result = backend.wait_for_device(Some(Duration::from_millis(250)));
        assert!(matches!(
            result,
            Err(BackendError::DeviceWaitTimeout { waited_ms: 250 })
        ));
    }

    #[test]
    fn test_align_resizes_depth_to_color_resolution() {
        let backend = MockBackend::new();
        backend
            .apply_stream_config(&StreamConfig::with_resolutions((1280, 720), (640, 480)))
            .unwrap();
        backend.start_pipeline().unwrap();

        let frames = backend.wait_for_frames().unwrap();
        let aligned = backend.align_to_color(frames).unwrap();
        let depth = aligned.depth.unwrap();
        assert_eq!((depth.width, depth.height), (1280, 720));
    }
}
