//! `info` command implementation.

use anyhow::{Context, Result};
use camera_client::CameraBackend;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    period_ms: u32,
    verbose: bool,
    registered: bool,
    rgb_resolution: String,
    depth_resolution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clip_planes: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_wait_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<DeviceProbe>,
}

#[derive(Serialize)]
struct DeviceProbe {
    name: String,
    serial_number: String,
    firmware_version: String,
    product_line: String,
    usb_type: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let device = if args.probe {
        Some(probe_device()?)
    } else {
        None
    };

    if args.json {
        let info = build_config_info(&config, device);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, device);
    }

    Ok(())
}

/// Query the device information without starting the pipeline
fn probe_device() -> Result<DeviceProbe> {
    let backend = build_backend()?;
    let device = backend
        .device_info()
        .context("Failed to probe the device")?;
    Ok(DeviceProbe {
        name: device.name,
        serial_number: device.serial_number,
        firmware_version: device.firmware_version,
        product_line: device.product_line,
        usb_type: device.usb_type,
    })
}

#[cfg(feature = "real-realsense")]
fn build_backend() -> Result<impl CameraBackend> {
    camera_client::RealSenseBackend::new().context("Failed to create the RealSense backend")
}

#[cfg(not(feature = "real-realsense"))]
fn build_backend() -> Result<impl CameraBackend> {
    Ok(camera_client::MockBackend::new())
}

fn build_config_info(config: &contracts::DriverConfig, device: Option<DeviceProbe>) -> ConfigInfo {
    ConfigInfo {
        period_ms: config.period,
        verbose: config.verbose,
        registered: config.registered,
        rgb_resolution: format!("{}x{}", config.rgb_resolution[0], config.rgb_resolution[1]),
        depth_resolution: format!(
            "{}x{}",
            config.depth_resolution[0], config.depth_resolution[1]
        ),
        accuracy: config.accuracy,
        clip_planes: config.clip_planes,
        device_wait_timeout_ms: config.device_wait_timeout_ms,
        device,
    }
}

fn print_config_info(config: &contracts::DriverConfig, device: Option<DeviceProbe>) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                RGBD Camera Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📷 Streams");
    println!(
        "   ├─ Color: {}x{}",
        config.rgb_resolution[0], config.rgb_resolution[1]
    );
    println!(
        "   └─ Depth: {}x{}",
        config.depth_resolution[0], config.depth_resolution[1]
    );

    println!("\n⚙️  Driver Settings");
    println!("   ├─ Period: {}ms", config.period);
    println!("   ├─ Verbose: {}", config.verbose);
    println!("   ├─ Registration display: {}", config.registered);
    match config.accuracy {
        Some(accuracy) => println!("   ├─ Accuracy: {}", accuracy),
        None => println!("   ├─ Accuracy: (sensor default)"),
    }
    match config.clip_planes {
        Some([near, far]) => println!("   ├─ Clip planes: {}m .. {}m", near, far),
        None => println!("   ├─ Clip planes: (sensor default)"),
    }
    match config.device_wait_timeout_ms {
        Some(ms) => println!("   └─ Device wait bound: {}ms", ms),
        None => println!("   └─ Device wait bound: none (waits indefinitely)"),
    }

    if let Some(device) = device {
        println!("\n🔌 Device");
        println!("   ├─ Name: {}", device.name);
        println!("   ├─ Serial: {}", device.serial_number);
        println!("   ├─ Firmware: {}", device.firmware_version);
        println!("   ├─ Product line: {}", device.product_line);
        println!("   └─ USB: {}", device.usb_type);
    }

    println!();
}
