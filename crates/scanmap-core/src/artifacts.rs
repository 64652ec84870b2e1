//! Outputs derived from the engine's map on every publishing tick.
//!
//! The 2D map and trajectory are lifted into 3D message shapes: points
//! get `z = 0` and headings become yaw-only quaternions.

use crate::{engine::GlobalMap, types::Pose2D};
use nalgebra::{Point3, UnitQuaternion};
use std::time::Duration;

/// Frame tag and time of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub frame_id: String,
    pub stamp: Duration,
}

/// A snapshot of every global map point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloudSnapshot {
    pub header: Header,
    pub points: Vec<Point3<f32>>,
}

/// A single 3D pose tagged with its frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseStamped {
    pub header: Header,
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl PoseStamped {
    /// Lifts a planar pose: `z = 0`, roll = pitch = 0, yaw = heading.
    pub fn from_pose2d(pose: &Pose2D, header: Header) -> Self {
        Self {
            header,
            position: Point3::new(pose.tx(), pose.ty(), 0.0),
            orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, pose.heading_rad()),
        }
    }
}

/// Every pose of the engine's history, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub header: Header,
    pub poses: Vec<PoseStamped>,
}

/// One emitted output.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Map(PointCloudSnapshot),
    Trajectory(Trajectory),
    CurrentPose(PoseStamped),
}

impl Artifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Map(_) => "map",
            Artifact::Trajectory(_) => "trajectory",
            Artifact::CurrentPose(_) => "current_pose",
        }
    }
}

/// The artifacts produced from one map snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TickArtifacts {
    pub map: PointCloudSnapshot,
    pub trajectory: Trajectory,
    /// The trajectory entry at the engine's last-pose slot.
    pub current_pose: Option<PoseStamped>,
}

impl TickArtifacts {
    /// Builds all artifacts from `map`, tagging them with `frame_id`.
    ///
    /// The current pose is the trajectory entry at the engine's
    /// designated last-pose slot. It is selected by position, so it is
    /// always the very value stored in the trajectory and never a
    /// recomputed approximation.
    pub fn from_map(map: &GlobalMap, frame_id: &str, stamp: Duration) -> Self {
        let header = Header {
            frame_id: frame_id.to_string(),
            stamp,
        };

        let points = map
            .global_points
            .iter()
            .map(|point| Point3::new(point.x as f32, point.y as f32, 0.0))
            .collect();

        let poses: Vec<PoseStamped> = map
            .poses
            .iter()
            .map(|pose| PoseStamped::from_pose2d(pose, header.clone()))
            .collect();

        let current_pose = map
            .last_pose_index
            .and_then(|index| poses.get(index))
            .cloned();

        Self {
            map: PointCloudSnapshot {
                header: header.clone(),
                points,
            },
            trajectory: Trajectory {
                header,
                poses,
            },
            current_pose,
        }
    }

    /// Publishing order: map, trajectory, then the current pose if any.
    pub fn into_artifacts(self) -> impl Iterator<Item = Artifact> {
        [
            Some(Artifact::Map(self.map)),
            Some(Artifact::Trajectory(self.trajectory)),
            self.current_pose.map(Artifact::CurrentPose),
        ]
        .into_iter()
        .flatten()
    }
}
