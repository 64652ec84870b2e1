use crate::{
    artifacts::TickArtifacts,
    engine::MappingEngine,
    error::{EngineFailure, Empty},
    pose::EnginePoseFeed,
    queue::SharedScanQueue,
    sink::ArtifactSink,
};
use std::time::Duration;
use tracing::{debug, error, warn};

/// What one consumer tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The queue was empty; nothing happened.
    Idle,
    /// One scan was processed and artifacts were emitted.
    Published {
        stamp: Duration,
        map_points: usize,
        trajectory_len: usize,
        has_current_pose: bool,
    },
}

/// Counters kept by the [PublishingConsumer].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    pub ticks: u64,
    pub idle_ticks: u64,
    pub processed: u64,
    pub publish_errors: u64,
}

/// Runs on a fixed period: takes at most one scan from the queue, feeds
/// it to the mapping engine and emits the map, the trajectory and the
/// current pose.
pub struct PublishingConsumer<E, S>
where
    E: MappingEngine,
    S: ArtifactSink,
{
    engine: E,
    sink: S,
    queue: SharedScanQueue,
    map_frame: String,
    pose_feed: Option<EnginePoseFeed>,
    stats: PublishStats,
}

impl<E, S> PublishingConsumer<E, S>
where
    E: MappingEngine,
    S: ArtifactSink,
{
    pub fn new(engine: E, sink: S, queue: SharedScanQueue, map_frame: impl Into<String>) -> Self {
        Self {
            engine,
            sink,
            queue,
            map_frame: map_frame.into(),
            pose_feed: None,
            stats: PublishStats::default(),
        }
    }

    /// Keeps `feed` updated with the engine's last pose after each
    /// processed scan.
    pub fn with_pose_feed(mut self, feed: EnginePoseFeed) -> Self {
        self.pose_feed = Some(feed);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn queue(&self) -> &SharedScanQueue {
        &self.queue
    }

    pub fn stats(&self) -> PublishStats {
        self.stats
    }

    /// Performs one publishing step.
    ///
    /// An engine failure is returned as-is and should stop the pipeline.
    /// A sink failure is only logged.
    pub fn tick(&mut self) -> Result<TickOutcome, EngineFailure> {
        self.stats.ticks += 1;

        let scan = match self.queue.pop_front() {
            Ok(scan) => scan,
            Err(Empty) => {
                self.stats.idle_ticks += 1;
                return Ok(TickOutcome::Idle);
            }
        };

        if let Err(err) = self.engine.process(&scan) {
            error!(stamp = ?scan.stamp, error = %err, "Mapping engine failed");
            return Err(err);
        }
        self.stats.processed += 1;

        let Some(map) = self.engine.map_snapshot() else {
            return Err(EngineFailure::new(
                "engine has no map snapshot after processing a scan",
            ));
        };

        if let Some(feed) = &self.pose_feed {
            feed.update(map.last_pose().copied());
        }

        let artifacts = TickArtifacts::from_map(map, &self.map_frame, scan.stamp);
        let outcome = TickOutcome::Published {
            stamp: scan.stamp,
            map_points: artifacts.map.points.len(),
            trajectory_len: artifacts.trajectory.poses.len(),
            has_current_pose: artifacts.current_pose.is_some(),
        };

        if artifacts.current_pose.is_none() {
            warn!(stamp = ?scan.stamp, "Engine designates no last pose in its trajectory");
        }

        for artifact in artifacts.into_artifacts() {
            let kind = artifact.kind();
            if let Err(err) = self.sink.publish(artifact) {
                self.stats.publish_errors += 1;
                warn!(artifact = kind, error = %err, "Failed to publish artifact");
            }
        }

        debug!(?outcome, queued = self.queue.len(), "Published tick");
        Ok(outcome)
    }
}
