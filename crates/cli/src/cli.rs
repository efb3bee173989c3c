//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// RGBD Cam - RealSense RGBD camera driver host
#[derive(Parser, Debug)]
#[command(
    name = "rgbd-cam",
    author,
    version,
    about = "RealSense RGBD camera driver host",
    long_about = "Drives an Intel RealSense depth/RGB camera as an RGBD sensor device.\n\n\
                  Opens the vendor pipeline from configuration, captures timestamped \n\
                  color/depth image pairs, and exposes the camera feature surface."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RGBD_CAM_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RGBD_CAM_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the camera and run the capture loop
    Run(RunArgs),

    /// Validate configuration file without opening the camera
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "RGBD_CAM_CONFIG")]
    pub config: PathBuf,

    /// Maximum number of framesets to capture (0 = unlimited)
    #[arg(long, default_value = "0", env = "RGBD_CAM_MAX_FRAMES")]
    pub max_frames: u64,

    /// Capture loop timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "RGBD_CAM_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without opening the camera
    #[arg(long)]
    pub dry_run: bool,

    /// Use the mock backend instead of real hardware
    #[arg(long, env = "RGBD_CAM_MOCK")]
    pub mock: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "RGBD_CAM_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Probe the device and include its description
    #[arg(long)]
    pub probe: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
