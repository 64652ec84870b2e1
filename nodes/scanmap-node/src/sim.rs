//! A synthetic range sensor orbiting inside a rectangular room.

use crate::config::SimulationConfig;
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use scanmap_core::{Pose2D, RawScan, StampedTransform};
use std::{f64::consts::TAU, time::Duration};

#[derive(Debug, Clone)]
pub struct RoomSimulator {
    config: SimulationConfig,
    sensor_frame: String,
    reference_frame: String,
}

impl RoomSimulator {
    pub fn new(
        config: SimulationConfig,
        reference_frame: impl Into<String>,
        sensor_frame: impl Into<String>,
    ) -> Self {
        Self {
            config,
            sensor_frame: sensor_frame.into(),
            reference_frame: reference_frame.into(),
        }
    }

    /// Ground-truth sensor pose at `stamp`, in room coordinates.
    pub fn pose_at(&self, stamp: Duration) -> Pose2D {
        let cfg = &self.config;
        let phase = (cfg.orbit_rate * stamp.as_secs_f64()).to_radians();

        Pose2D::new(
            cfg.room_width / 2.0 + cfg.orbit_radius * phase.cos(),
            cfg.room_height / 2.0 + cfg.orbit_radius * phase.sin(),
            (phase.to_degrees() + 90.0) % 360.0,
        )
    }

    /// The odometry transform of the sensor at `stamp`.
    pub fn odometry_at(&self, stamp: Duration) -> StampedTransform {
        let pose = self.pose_at(stamp);
        StampedTransform {
            stamp,
            parent: self.reference_frame.clone(),
            child: self.sensor_frame.clone(),
            transform: Isometry3::from_parts(
                Translation3::new(pose.tx(), pose.ty(), 0.0),
                UnitQuaternion::from_euler_angles(0.0, 0.0, pose.heading_rad()),
            ),
        }
    }

    /// A full revolution scan taken at `stamp`.
    ///
    /// Returns beyond `range_max` are reported as infinite.
    pub fn scan_at(&self, stamp: Duration) -> RawScan {
        let cfg = &self.config;
        let pose = self.pose_at(stamp);
        let increment = TAU / cfg.beams as f64;

        let ranges = (0..cfg.beams)
            .map(|beam| {
                let bearing = pose.heading_rad() + beam as f64 * increment;
                let range = self.distance_to_wall(pose.tx(), pose.ty(), bearing);
                if range < cfg.range_max {
                    range
                } else {
                    f64::INFINITY
                }
            })
            .collect();

        RawScan {
            stamp,
            frame_id: self.sensor_frame.clone(),
            angle_min: 0.0,
            angle_max: increment * (cfg.beams - 1) as f64,
            angle_increment: increment,
            range_min: cfg.range_min,
            range_max: cfg.range_max,
            ranges,
        }
    }

    /// Distance from `(x, y)` to the first wall along `bearing`.
    fn distance_to_wall(&self, x: f64, y: f64, bearing: f64) -> f64 {
        let (dy, dx) = bearing.sin_cos();
        let cfg = &self.config;

        let along_x = if dx > f64::EPSILON {
            (cfg.room_width - x) / dx
        } else if dx < -f64::EPSILON {
            -x / dx
        } else {
            f64::INFINITY
        };

        let along_y = if dy > f64::EPSILON {
            (cfg.room_height - y) / dy
        } else if dy < -f64::EPSILON {
            -y / dy
        } else {
            f64::INFINITY
        };

        along_x.min(along_y)
    }
}
