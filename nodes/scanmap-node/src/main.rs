//! scanmap node entry point.

mod config;
mod sim;
mod sink;

use crate::{config::Config, sim::RoomSimulator, sink::LoggingSink};
use eyre::{Result, WrapErr};
use scanmap_core::{DeadReckoningEngine, Pipeline, PoseSource, RawScan, SharedTransformBuffer};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(config_file) => {
            info!(config_file = %config_file, "Loading configuration");
            Config::load(&config_file)?
        }
        None => {
            info!("No config file given, using defaults");
            Config::default()
        }
    };

    info!(
        pose_source = ?config.pipeline.pose_source,
        capacity = config.pipeline.queue.capacity,
        period = ?config.pipeline.publish.period,
        scan_period = ?config.simulation.scan_period,
        "Configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("Failed to create tokio runtime")?;

    runtime.block_on(run(config))?;

    info!("scanmap node shutting down");
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let sink = LoggingSink::new(Duration::from_secs(1));
    let pipeline = Pipeline::from_config(&config.pipeline, DeadReckoningEngine::new(), sink)?;

    let frames = &config.pipeline.frames;
    let simulator = RoomSimulator::new(
        config.simulation.clone(),
        &frames.reference,
        &frames.sensor,
    );

    // Odometry only matters when poses are looked up externally.
    let transforms = match config.pipeline.pose_source {
        PoseSource::External => pipeline.transforms().cloned(),
        PoseSource::Engine => None,
    };

    let (scan_tx, scan_rx) = flume::bounded(64);
    let source = tokio::spawn(run_source(
        simulator,
        config.simulation.scan_period,
        config.simulation.duration,
        transforms,
        scan_tx,
    ));

    tokio::select! {
        report = pipeline.run(scan_rx) => {
            let report = report?;
            info!(?report, "Pipeline finished");
        }
        result = tokio::signal::ctrl_c() => {
            result.wrap_err("Failed to listen for ctrl-c")?;
            info!("Interrupted");
        }
    }

    source.abort();
    Ok(())
}

/// Emits simulated scans until `duration` elapses or the pipeline stops
/// listening.
async fn run_source(
    simulator: RoomSimulator,
    scan_period: Duration,
    duration: Option<Duration>,
    transforms: Option<SharedTransformBuffer>,
    scan_tx: flume::Sender<RawScan>,
) {
    let mut interval = time::interval(scan_period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut stamp = Duration::ZERO;
    loop {
        interval.tick().await;
        stamp += scan_period;

        if duration.is_some_and(|duration| stamp > duration) {
            debug!(?stamp, "Simulation finished");
            break;
        }

        if let Some(transforms) = &transforms {
            transforms.insert(simulator.odometry_at(stamp));
        }

        if scan_tx.send_async(simulator.scan_at(stamp)).await.is_err() {
            warn!("Scan receiver closed, stopping simulation");
            break;
        }
    }
}
