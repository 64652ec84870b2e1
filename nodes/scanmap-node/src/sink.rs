use eyre::Result;
use scanmap_core::{Artifact, ArtifactSink};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Reports published artifacts through the log.
///
/// Map and trajectory updates arrive on every processed scan, so they go
/// to `debug`. The current pose is summarized at `info` once per
/// `summary_period`.
#[derive(Debug)]
pub struct LoggingSink {
    summary_period: Duration,
    last_summary: Option<Instant>,
    map_points: usize,
    trajectory_len: usize,
}

impl LoggingSink {
    pub fn new(summary_period: Duration) -> Self {
        Self {
            summary_period,
            last_summary: None,
            map_points: 0,
            trajectory_len: 0,
        }
    }
}

impl ArtifactSink for LoggingSink {
    fn publish(&mut self, artifact: Artifact) -> Result<()> {
        match artifact {
            Artifact::Map(cloud) => {
                self.map_points = cloud.points.len();
                debug!(frame = %cloud.header.frame_id, points = self.map_points, "Map updated");
            }
            Artifact::Trajectory(path) => {
                self.trajectory_len = path.poses.len();
                debug!(
                    frame = %path.header.frame_id,
                    poses = self.trajectory_len,
                    "Trajectory updated"
                );
            }
            Artifact::CurrentPose(pose) => {
                let due = self
                    .last_summary
                    .is_none_or(|last| last.elapsed() >= self.summary_period);
                if due {
                    let (_, _, yaw) = pose.orientation.euler_angles();
                    info!(
                        stamp = ?pose.header.stamp,
                        x = pose.position.x,
                        y = pose.position.y,
                        heading = yaw.to_degrees(),
                        map_points = self.map_points,
                        trajectory_len = self.trajectory_len,
                        "Current pose"
                    );
                    self.last_summary = Some(Instant::now());
                }
            }
        }
        Ok(())
    }
}
