//! Real RealSense backend
//!
//! Connects to the camera through the realsense-rust binding. Only
//! compiled with the `real-realsense` feature.

use std::collections::HashSet;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{Distortion, Extrinsics, Intrinsics};
use realsense_rust::{
    config::Config,
    context::Context,
    device::Device,
    frame::{ColorFrame, DepthFrame as RsDepthFrame, FrameEx},
    kind::{Rs2CameraInfo, Rs2Format, Rs2Option, Rs2ProductLine, Rs2StreamKind},
    pipeline::{ActivePipeline, InactivePipeline},
    sensor::Sensor,
};
use tracing::{debug, info, instrument};

use crate::client::CameraBackend;
use crate::error::{BackendError, Result};
use crate::types::{
    DepthFrame, DeviceInfo, FrameSet, SensorHandle, SensorKind, SensorOption, SensorSet,
    StreamConfig, StreamFormat, StreamKind, StreamProfile, VideoFrame,
};

/// Poll interval of the device hot-plug wait
const DEVICE_POLL_INTERVAL: Duration = Duration::from_millis(500);

struct Inner {
    context: Context,
    stream_config: StreamConfig,
    pipeline: Option<ActivePipeline>,
    device: Option<Device>,
    depth_sensor: Option<Sensor>,
    color_sensor: Option<Sensor>,
}

/// Real RealSense backend
///
/// Wraps the realsense-rust pipeline and device objects, implements the
/// `CameraBackend` trait. Uses a Mutex for interior mutability so `&self`
/// option queries can touch the SDK handles.
pub struct RealSenseBackend {
    inner: Mutex<Inner>,
}

impl RealSenseBackend {
    /// Create a new backend (pipeline not yet started)
    pub fn new() -> Result<Self> {
        let context = Context::new()
            .map_err(|e| BackendError::sdk(format!("failed to create context: {e:?}")))?;
        Ok(Self {
            inner: Mutex::new(Inner {
                context,
                stream_config: StreamConfig::with_resolutions((640, 480), (640, 480)),
                pipeline: None,
                device: None,
                depth_sensor: None,
                color_sensor: None,
            }),
        })
    }

    fn any_product_line() -> HashSet<Rs2ProductLine> {
        let mut lines = HashSet::new();
        lines.insert(Rs2ProductLine::Any);
        lines
    }

    fn to_rs2_format(format: StreamFormat) -> Rs2Format {
        match format {
            StreamFormat::Rgb8 => Rs2Format::Rgb8,
            StreamFormat::Bgr8 => Rs2Format::Bgr8,
            StreamFormat::Rgba8 => Rs2Format::Rgba8,
            StreamFormat::Bgra8 => Rs2Format::Bgra8,
            StreamFormat::Y8 => Rs2Format::Y8,
            StreamFormat::Y16 => Rs2Format::Y16,
            StreamFormat::Z16 => Rs2Format::Z16,
            StreamFormat::Disparity16 => Rs2Format::Disparity16,
            StreamFormat::Raw8 => Rs2Format::Raw8,
            StreamFormat::Raw16 => Rs2Format::Raw16,
            StreamFormat::Other => Rs2Format::Any,
        }
    }

    fn from_rs2_format(format: Rs2Format) -> StreamFormat {
        match format {
            Rs2Format::Rgb8 => StreamFormat::Rgb8,
            Rs2Format::Bgr8 => StreamFormat::Bgr8,
            Rs2Format::Rgba8 => StreamFormat::Rgba8,
            Rs2Format::Bgra8 => StreamFormat::Bgra8,
            Rs2Format::Y8 => StreamFormat::Y8,
            Rs2Format::Y16 => StreamFormat::Y16,
            Rs2Format::Z16 => StreamFormat::Z16,
            Rs2Format::Disparity16 => StreamFormat::Disparity16,
            Rs2Format::Raw8 => StreamFormat::Raw8,
            Rs2Format::Raw16 => StreamFormat::Raw16,
            _ => StreamFormat::Other,
        }
    }

    fn to_rs2_option(option: SensorOption) -> Rs2Option {
        match option {
            SensorOption::Exposure => Rs2Option::Exposure,
            SensorOption::Gain => Rs2Option::Gain,
            SensorOption::WhiteBalance => Rs2Option::WhiteBalance,
            SensorOption::Sharpness => Rs2Option::Sharpness,
            SensorOption::Hue => Rs2Option::Hue,
            SensorOption::Saturation => Rs2Option::Saturation,
            SensorOption::EnableAutoExposure => Rs2Option::EnableAutoExposure,
            SensorOption::EnableAutoWhiteBalance => Rs2Option::EnableAutoWhiteBalance,
            SensorOption::Accuracy => Rs2Option::Accuracy,
            SensorOption::MinDistance => Rs2Option::MinDistance,
            SensorOption::MaxDistance => Rs2Option::MaxDistance,
            SensorOption::DepthUnits => Rs2Option::DepthUnits,
        }
    }

    /// All sensor options the driver may address, used for the verbose dump
    const DUMPABLE_OPTIONS: [SensorOption; 12] = [
        SensorOption::Exposure,
        SensorOption::Gain,
        SensorOption::WhiteBalance,
        SensorOption::Sharpness,
        SensorOption::Hue,
        SensorOption::Saturation,
        SensorOption::EnableAutoExposure,
        SensorOption::EnableAutoWhiteBalance,
        SensorOption::Accuracy,
        SensorOption::MinDistance,
        SensorOption::MaxDistance,
        SensorOption::DepthUnits,
    ];

    fn frame_bytes<F: FrameEx>(frame: &F) -> Bytes {
        // SAFETY: the raw slice is valid for the lifetime of `frame`; it is
        // copied out before the frame is released.
        let raw = unsafe {
            std::slice::from_raw_parts(
                frame.get_data() as *const _ as *const u8,
                frame.get_data_size(),
            )
        };
        Bytes::copy_from_slice(raw)
    }

    fn info_string(device: &Device, info: Rs2CameraInfo) -> String {
        device
            .info(info)
            .and_then(|s| s.to_str().ok())
            .unwrap_or("N/A")
            .to_string()
    }

    fn with_sensor<R>(
        &self,
        sensor: SensorKind,
        f: impl FnOnce(&Sensor) -> Result<R>,
    ) -> Result<R> {
        let inner = self.inner.lock().unwrap();
        let handle = match sensor {
            SensorKind::Depth => inner.depth_sensor.as_ref(),
            SensorKind::Color => inner.color_sensor.as_ref(),
        };
        match handle {
            Some(s) => f(s),
            None => Err(BackendError::DeviceUnavailable {
                message: "sensors not discovered yet".into(),
            }),
        }
    }

    fn profile_of(inner: &Inner, stream: StreamKind) -> Result<StreamProfile> {
        let pipeline = inner.pipeline.as_ref().ok_or(BackendError::StreamProfile {
            stream,
            message: "pipeline not started".into(),
        })?;

        let kind = match stream {
            StreamKind::Color => Rs2StreamKind::Color,
            StreamKind::Depth => Rs2StreamKind::Depth,
        };

        let profile = pipeline
            .profile()
            .streams()
            .into_iter()
            .find(|s| s.kind() == kind)
            .ok_or_else(|| BackendError::StreamProfile {
                stream,
                message: "stream not active".into(),
            })?;

        let intrin = profile.intrinsics().map_err(|e| BackendError::StreamProfile {
            stream,
            message: format!("{e:?}"),
        })?;

        Ok(StreamProfile {
            stream,
            format: Self::from_rs2_format(profile.format()),
            intrinsics: Intrinsics {
                width: intrin.width() as u32,
                height: intrin.height() as u32,
                fx: intrin.fx() as f64,
                fy: intrin.fy() as f64,
                ppx: intrin.ppx() as f64,
                ppy: intrin.ppy() as f64,
                distortion: {
                    let coeffs = intrin.coeffs();
                    Distortion {
                        k1: coeffs[0] as f64,
                        k2: coeffs[1] as f64,
                        t1: coeffs[2] as f64,
                        t2: coeffs[3] as f64,
                        k3: coeffs[4] as f64,
                    }
                },
            },
        })
    }

    /// Reproject a depth frame into the color viewpoint.
    ///
    /// The binding does not expose the SDK's align processing block, so the
    /// backend performs the same deproject/transform/project sequence the
    /// vendor helper runs, keeping the nearest hit per target pixel.
    fn reproject_depth(
        depth: &DepthFrame,
        depth_intrin: &Intrinsics,
        color_intrin: &Intrinsics,
        depth_to_color: &Extrinsics,
    ) -> DepthFrame {
        let cw = color_intrin.width;
        let ch = color_intrin.height;
        let mut out = vec![0u16; cw as usize * ch as usize];

        for y in 0..depth.height {
            for x in 0..depth.width {
                let idx = (y as usize * depth.width as usize + x as usize) * 2;
                let raw = u16::from_le_bytes([depth.data[idx], depth.data[idx + 1]]);
                if raw == 0 {
                    continue;
                }
                let z = raw as f32 * depth.depth_units;

                let px = (x as f32 - depth_intrin.ppx as f32) / depth_intrin.fx as f32 * z;
                let py = (y as f32 - depth_intrin.ppy as f32) / depth_intrin.fy as f32 * z;
                let point = depth_to_color.transform([px, py, z]);
                if point[2] <= 0.0 {
                    continue;
                }

                let cx = (point[0] / point[2] * color_intrin.fx as f32
                    + color_intrin.ppx as f32)
                    .round() as i64;
                let cy = (point[1] / point[2] * color_intrin.fy as f32
                    + color_intrin.ppy as f32)
                    .round() as i64;
                if cx < 0 || cy < 0 || cx >= cw as i64 || cy >= ch as i64 {
                    continue;
                }

                let target = &mut out[cy as usize * cw as usize + cx as usize];
                let projected = (point[2] / depth.depth_units) as u16;
                if *target == 0 || projected < *target {
                    *target = projected;
                }
            }
        }

        let mut data = Vec::with_capacity(out.len() * 2);
        for value in out {
            data.extend_from_slice(&value.to_le_bytes());
        }
        DepthFrame {
            width: cw,
            height: ch,
            format: StreamFormat::Z16,
            depth_units: depth.depth_units,
            data: Bytes::from(data),
        }
    }
}

impl CameraBackend for RealSenseBackend {
    fn apply_stream_config(&self, config: &StreamConfig) -> Result<()> {
        self.inner.lock().unwrap().stream_config = *config;
        Ok(())
    }

    #[instrument(name = "realsense_start_pipeline", skip(self))]
    fn start_pipeline(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();

        let pipeline =
            InactivePipeline::try_from(&inner.context).map_err(|e| BackendError::PipelineStart {
                message: format!("failed to create pipeline: {e:?}"),
            })?;

        let mut config = Config::new();
        let color = inner.stream_config.color;
        let depth = inner.stream_config.depth;
        config
            .enable_stream(
                Rs2StreamKind::Color,
                None,
                color.width as usize,
                color.height as usize,
                Self::to_rs2_format(color.format),
                color.framerate as usize,
            )
            .and_then(|c| {
                c.enable_stream(
                    Rs2StreamKind::Depth,
                    None,
                    depth.width as usize,
                    depth.height as usize,
                    Self::to_rs2_format(depth.format),
                    depth.framerate as usize,
                )
            })
            .map_err(|e| BackendError::PipelineStart {
                message: format!("failed to declare streams: {e:?}"),
            })?;

        let active = pipeline
            .start(Some(config))
            .map_err(|e| BackendError::PipelineStart {
                message: format!("{e:?}"),
            })?;

        info!(
            color_res = format!("{}x{}", color.width, color.height),
            depth_res = format!("{}x{}", depth.width, depth.height),
            "pipeline started"
        );
        inner.pipeline = Some(active);
        Ok(())
    }

    #[instrument(name = "realsense_stop_pipeline", skip(self))]
    fn stop_pipeline(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.pipeline.take() {
            Some(pipeline) => {
                // stop() consumes the active pipeline
                let _inactive = pipeline.stop();
                debug!("pipeline stopped");
                Ok(())
            }
            None => Err(BackendError::PipelineStop {
                message: "pipeline not running".into(),
            }),
        }
    }

    fn wait_for_frames(&self) -> Result<FrameSet> {
        let mut inner = self.inner.lock().unwrap();
        let depth_units = inner
            .depth_sensor
            .as_ref()
            .and_then(|s| s.get_option(Rs2Option::DepthUnits))
            .unwrap_or(0.001);

        let pipeline = inner.pipeline.as_mut().ok_or(BackendError::FrameWait {
            message: "pipeline not running".into(),
        })?;

        let frames = pipeline.wait(None).map_err(|e| BackendError::FrameWait {
            message: format!("{e:?}"),
        })?;

        let color = frames
            .frames_of_type::<ColorFrame>()
            .pop()
            .map(|frame| VideoFrame {
                width: frame.width() as u32,
                height: frame.height() as u32,
                format: StreamFormat::Rgb8,
                data: Self::frame_bytes(&frame),
            });

        let depth = frames
            .frames_of_type::<RsDepthFrame>()
            .pop()
            .map(|frame| DepthFrame {
                width: frame.width() as u32,
                height: frame.height() as u32,
                format: StreamFormat::Z16,
                depth_units,
                data: Self::frame_bytes(&frame),
            });

        Ok(FrameSet { color, depth })
    }

    fn align_to_color(&self, frames: FrameSet) -> Result<FrameSet> {
        let (depth_intrin, color_intrin) = {
            let inner = self.inner.lock().unwrap();
            (
                Self::profile_of(&inner, StreamKind::Depth)?.intrinsics,
                Self::profile_of(&inner, StreamKind::Color)?.intrinsics,
            )
        };
        let depth_to_color = self.extrinsics(StreamKind::Depth, StreamKind::Color)?;

        let depth = frames
            .depth
            .map(|d| Self::reproject_depth(&d, &depth_intrin, &color_intrin, &depth_to_color));
        Ok(FrameSet {
            color: frames.color,
            depth,
        })
    }

    fn device_present(&self) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(!inner
            .context
            .query_devices(Self::any_product_line())
            .is_empty())
    }

    #[instrument(name = "realsense_wait_for_device", skip(self))]
    fn wait_for_device(&self, timeout: Option<Duration>) -> Result<()> {
        // Device-hub semantics: poll enumeration until a device shows up.
        let started = Instant::now();
        loop {
            {
                let mut inner = self.inner.lock().unwrap();
                let mut devices = inner.context.query_devices(Self::any_product_line());
                if !devices.is_empty() {
                    let device = devices.remove(0);
                    info!(
                        serial = %Self::info_string(&device, Rs2CameraInfo::SerialNumber),
                        "device connected"
                    );
                    inner.device = Some(device);
                    return Ok(());
                }
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    return Err(BackendError::DeviceWaitTimeout {
                        waited_ms: limit.as_millis() as u64,
                    });
                }
            }
            thread::sleep(DEVICE_POLL_INTERVAL);
        }
    }

    fn device_info(&self) -> Result<DeviceInfo> {
        let mut inner = self.inner.lock().unwrap();
        if inner.device.is_none() {
            let mut devices = inner.context.query_devices(Self::any_product_line());
            if devices.is_empty() {
                return Err(BackendError::DeviceUnavailable {
                    message: "no device enumerated".into(),
                });
            }
            inner.device = Some(devices.remove(0));
        }

        let device = inner.device.as_ref().unwrap();
        Ok(DeviceInfo {
            name: Self::info_string(device, Rs2CameraInfo::Name),
            serial_number: Self::info_string(device, Rs2CameraInfo::SerialNumber),
            firmware_version: Self::info_string(device, Rs2CameraInfo::FirmwareVersion),
            product_line: Self::info_string(device, Rs2CameraInfo::ProductLine),
            usb_type: Self::info_string(device, Rs2CameraInfo::UsbTypeDescriptor),
        })
    }

    #[instrument(name = "realsense_query_sensors", skip(self))]
    fn query_sensors(&self) -> Result<SensorSet> {
        let mut inner = self.inner.lock().unwrap();
        let device = inner.device.as_ref().ok_or(BackendError::DeviceUnavailable {
            message: "no device enumerated".into(),
        })?;

        let mut depth_handle = None;
        let mut color_handle = None;
        let mut depth_sensor = None;
        let mut color_sensor = None;

        for sensor in device.sensors() {
            let name = sensor
                .info(Rs2CameraInfo::Name)
                .and_then(|s| s.to_str().ok())
                .unwrap_or("unknown")
                .to_string();

            // Capability query: the stereo module is the only sensor that
            // carries a depth scale.
            if sensor.supports_option(Rs2Option::DepthUnits) {
                depth_handle = Some(SensorHandle {
                    name,
                    kind: SensorKind::Depth,
                });
                depth_sensor = Some(sensor);
            } else {
                color_handle = Some(SensorHandle {
                    name,
                    kind: SensorKind::Color,
                });
                color_sensor = Some(sensor);
            }
        }

        match (depth_handle, color_handle) {
            (Some(depth), Some(color)) => {
                debug!(depth = %depth.name, color = %color.name, "sensors classified");
                inner.depth_sensor = depth_sensor;
                inner.color_sensor = color_sensor;
                Ok(SensorSet { depth, color })
            }
            _ => Err(BackendError::DeviceUnavailable {
                message: "device does not expose both depth and color sensors".into(),
            }),
        }
    }

    fn supports_option(&self, sensor: SensorKind, option: SensorOption) -> Result<bool> {
        self.with_sensor(sensor, |s| Ok(s.supports_option(Self::to_rs2_option(option))))
    }

    fn option(&self, sensor: SensorKind, option: SensorOption) -> Result<f32> {
        self.with_sensor(sensor, |s| {
            s.get_option(Self::to_rs2_option(option))
                .ok_or(BackendError::OptionAccess {
                    option,
                    message: "option read failed".into(),
                })
        })
    }

    fn set_option(&self, sensor: SensorKind, option: SensorOption, value: f32) -> Result<()> {
        self.with_sensor(sensor, |s| {
            if !s.supports_option(Self::to_rs2_option(option)) {
                return Err(BackendError::OptionUnsupported { sensor, option });
            }
            s.set_option(Self::to_rs2_option(option), value)
                .map_err(|e| BackendError::OptionAccess {
                    option,
                    message: format!("{e:?}"),
                })
        })
    }

    fn supported_options(&self, sensor: SensorKind) -> Result<Vec<(SensorOption, f32)>> {
        self.with_sensor(sensor, |s| {
            let mut options = Vec::new();
            for option in Self::DUMPABLE_OPTIONS {
                if s.supports_option(Self::to_rs2_option(option)) {
                    if let Some(value) = s.get_option(Self::to_rs2_option(option)) {
                        options.push((option, value));
                    }
                }
            }
            Ok(options)
        })
    }

    fn stream_profile(&self, stream: StreamKind) -> Result<StreamProfile> {
        let inner = self.inner.lock().unwrap();
        Self::profile_of(&inner, stream)
    }

    fn extrinsics(&self, from: StreamKind, to: StreamKind) -> Result<Extrinsics> {
        let inner = self.inner.lock().unwrap();
        let pipeline = inner.pipeline.as_ref().ok_or(BackendError::StreamProfile {
            stream: from,
            message: "pipeline not started".into(),
        })?;

        let kind_of = |stream: StreamKind| match stream {
            StreamKind::Color => Rs2StreamKind::Color,
            StreamKind::Depth => Rs2StreamKind::Depth,
        };

        let streams = pipeline.profile().streams();
        let find = |kind: Rs2StreamKind, stream: StreamKind| {
            streams
                .iter()
                .find(|s| s.kind() == kind)
                .ok_or(BackendError::StreamProfile {
                    stream,
                    message: "stream not active".into(),
                })
        };
        let from_profile = find(kind_of(from), from)?;
        let to_profile = find(kind_of(to), to)?;

        let ext = from_profile
            .extrinsics(to_profile)
            .map_err(|e| BackendError::sdk(format!("extrinsics query failed: {e:?}")))?;

        Ok(Extrinsics {
            rotation: ext.rotation,
            translation: ext.translation,
        })
    }
}
