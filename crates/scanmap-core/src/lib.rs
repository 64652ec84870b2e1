//! This library decouples a high-rate stream of 2D laser scans from a
//! slower, timer-driven map publishing cadence.
//!
//! Incoming scans are converted to filtered Cartesian points, paired with
//! a pose, and parked in a bounded queue. A periodic consumer takes one
//! scan per tick, hands it to a [MappingEngine], and emits the engine's
//! global map, its trajectory, and the current pose.
//!
//! # Usage
//!
//! ```rust
//! use scanmap_core::{
//!     Artifact, ChannelSink, Config, DeadReckoningEngine, Pipeline, RawScan,
//! };
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> eyre::Result<()> {
//! let config = Config::default();
//! let (sink, artifacts) = ChannelSink::unbounded();
//! let pipeline = Pipeline::from_config(&config, DeadReckoningEngine::new(), sink)?;
//!
//! // Feed scans through a channel, then close it.
//! let (scan_tx, scan_rx) = flume::unbounded();
//! scan_tx.send(RawScan {
//!     stamp: Duration::from_millis(100),
//!     frame_id: "laser".to_string(),
//!     angle_min: 0.0,
//!     angle_max: 0.1,
//!     angle_increment: 0.1,
//!     range_min: 0.1,
//!     range_max: 10.0,
//!     ranges: vec![1.0, 2.0],
//! })?;
//! drop(scan_tx);
//!
//! // Runs until the source closes and the queue drains.
//! let report = pipeline.run(scan_rx).await?;
//! assert_eq!(report.publish.processed, 1);
//!
//! let kinds: Vec<_> = artifacts.drain().map(|artifact| artifact.kind()).collect();
//! assert_eq!(kinds, ["map", "trajectory", "current_pose"]);
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod config;
mod consumer;
mod convert;
pub mod engine;
pub mod error;
mod pipeline;
pub mod pose;
mod producer;
pub mod queue;
mod sink;
pub mod transform;
mod types;

pub use artifacts::{Artifact, Header, PointCloudSnapshot, PoseStamped, TickArtifacts, Trajectory};
pub use config::{Config, PoseSource};
pub use consumer::{PublishStats, PublishingConsumer, TickOutcome};
pub use convert::ScanConverter;
pub use engine::{DeadReckoningEngine, EngineState, GlobalMap, MappingEngine};
pub use error::{Empty, EngineFailure, TransformUnavailable};
pub use pipeline::{Pipeline, PipelineReport};
pub use pose::{
    EnginePoseFeed, EnginePoseResolver, ExternalPoseResolver, PoseResolver, engine_pose_channel,
};
pub use producer::{IngestOutcome, IngestStats, IngestionProducer};
pub use queue::{BoundedScanQueue, SharedScanQueue};
pub use sink::{ArtifactSink, ChannelSink};
pub use transform::{SharedTransformBuffer, StampedTransform, TransformBuffer, TransformLookup};
pub use types::*;
