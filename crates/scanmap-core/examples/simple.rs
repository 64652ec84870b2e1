use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use scanmap_core::{
    Artifact, ChannelSink, Config, DeadReckoningEngine, Pipeline, PoseSource, RawScan,
    StampedTransform,
};
use std::time::Duration;

// A sensor that sees a wall 2 m ahead while driving forward.
fn scan(stamp: Duration, distance: f64) -> RawScan {
    RawScan {
        stamp,
        frame_id: "base_link".to_string(),
        angle_min: -0.1,
        angle_max: 0.1,
        angle_increment: 0.1,
        range_min: 0.1,
        range_max: 10.0,
        ranges: vec![distance, distance, distance],
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = Config {
        pose_source: PoseSource::External,
        ..Config::default()
    };
    let (sink, artifacts) = ChannelSink::unbounded();
    let pipeline = Pipeline::from_config(&config, DeadReckoningEngine::new(), sink)?;

    // Odometry and scans for the first second of driving.
    let transforms = pipeline.transforms().cloned().unwrap_or_default();
    let (scan_tx, scan_rx) = flume::unbounded();
    for step in 1..=10u64 {
        let stamp = Duration::from_millis(step * 100);
        let x = step as f64 * 0.1;

        transforms.insert(StampedTransform {
            stamp,
            parent: "odom".to_string(),
            child: "base_link".to_string(),
            transform: Isometry3::from_parts(
                Translation3::new(x, 0.0, 0.0),
                UnitQuaternion::identity(),
            ),
        });
        scan_tx.send(scan(stamp, 2.0 - x))?;
    }
    drop(scan_tx);

    let report = pipeline.run(scan_rx).await?;
    println!("{report:#?}");

    if let Some(Artifact::Map(cloud)) = artifacts
        .drain()
        .filter(|artifact| matches!(artifact, Artifact::Map(_)))
        .last()
    {
        println!("map has {} points", cloud.points.len());
    }

    Ok(())
}
