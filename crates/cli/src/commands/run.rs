//! `run` command implementation.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{run_capture_loop, CaptureOptions};

/// Execute the `run` command
pub async fn run_capture(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let driver_config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        period_ms = driver_config.period,
        rgb_res = format!(
            "{}x{}",
            driver_config.rgb_resolution[0], driver_config.rgb_resolution[1]
        ),
        depth_res = format!(
            "{}x{}",
            driver_config.depth_resolution[0], driver_config.depth_resolution[1]
        ),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&driver_config);
        return Ok(());
    }

    // Metrics exporter (logging is already initialized by main)
    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)
            .context("Failed to start metrics exporter")?;
    }

    let options = CaptureOptions {
        driver_config,
        max_frames: if args.max_frames == 0 {
            None
        } else {
            Some(args.max_frames)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        use_mock: args.mock,
    };

    // The driver is blocking; run it on a worker thread with a stop flag
    // flipped by the shutdown signal.
    let stop = Arc::new(AtomicBool::new(false));
    let loop_stop = Arc::clone(&stop);
    let mut handle = tokio::task::spawn_blocking(move || run_capture_loop(options, loop_stop));

    info!("Starting capture loop...");

    let finished = tokio::select! {
        result = &mut handle => Some(result),
        _ = shutdown_signal() => None,
    };

    let result = match finished {
        Some(result) => result,
        None => {
            warn!("Received shutdown signal, stopping capture loop...");
            stop.store(true, Ordering::Relaxed);
            handle.await
        }
    };

    let stats = result
        .context("Capture task panicked")?
        .context("Capture loop failed")?;

    info!(
        frames = stats.frames_captured,
        failures = stats.failures,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Capture loop completed"
    );
    stats.print_summary();

    info!("RGBD camera CLI finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::DriverConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Period: {}ms", config.period);
    println!(
        "Color: {}x{}",
        config.rgb_resolution[0], config.rgb_resolution[1]
    );
    println!(
        "Depth: {}x{}",
        config.depth_resolution[0], config.depth_resolution[1]
    );

    if let Some(accuracy) = config.accuracy {
        println!("Accuracy: {accuracy}");
    }
    if let Some([near, far]) = config.clip_planes {
        println!("Clip planes: {near}m .. {far}m");
    }
    match config.device_wait_timeout_ms {
        Some(ms) => println!("Device wait bound: {ms}ms"),
        None => println!("Device wait bound: none (waits indefinitely)"),
    }

    println!();
}
