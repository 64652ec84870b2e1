//! The seam to the mapping engine that owns the global map.
//!
//! Scan matching, loop closure and optimization live behind
//! [MappingEngine]; this crate only prepares its inputs and relays its
//! outputs. [DeadReckoningEngine] is a reference engine that trusts the
//! pose hints it is given.

use crate::{
    error::EngineFailure,
    types::{ConvertedScan, Point2D, Pose2D},
};

/// Lifecycle of a mapping engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// No scan has been processed; there is no map yet.
    #[default]
    Uninitialized,
    /// At least one scan has been processed; snapshots are available.
    Ready,
}

/// The accumulated map maintained by an engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalMap {
    /// Accumulated points in the map frame. Order carries no meaning.
    pub global_points: Vec<Point2D>,
    /// Accepted poses in acceptance order.
    pub poses: Vec<Pose2D>,
    /// Slot in `poses` holding the most recently accepted pose.
    pub last_pose_index: Option<usize>,
}

impl GlobalMap {
    /// The engine's designated last pose.
    pub fn last_pose(&self) -> Option<&Pose2D> {
        self.poses.get(self.last_pose_index?)
    }
}

/// A mapping engine that consumes posed point sets.
pub trait MappingEngine: Send {
    fn state(&self) -> EngineState;

    /// Integrates one scan, updating the map and the trajectory.
    ///
    /// The first successful call moves the engine to [EngineState::Ready].
    fn process(&mut self, scan: &ConvertedScan) -> Result<(), EngineFailure>;

    /// A read-only view of the current map, absent while uninitialized.
    fn map_snapshot(&self) -> Option<&GlobalMap>;
}

impl<E> MappingEngine for Box<E>
where
    E: MappingEngine + ?Sized,
{
    fn state(&self) -> EngineState {
        (**self).state()
    }

    fn process(&mut self, scan: &ConvertedScan) -> Result<(), EngineFailure> {
        (**self).process(scan)
    }

    fn map_snapshot(&self) -> Option<&GlobalMap> {
        (**self).map_snapshot()
    }
}

/// An engine that accepts every pose hint as the true pose.
///
/// Each scan's points are moved into the map frame with its pose and
/// appended to the map; the pose is appended to the trajectory and
/// becomes the last pose.
#[derive(Debug, Default)]
pub struct DeadReckoningEngine {
    map: Option<GlobalMap>,
}

impl DeadReckoningEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MappingEngine for DeadReckoningEngine {
    fn state(&self) -> EngineState {
        match self.map {
            Some(_) => EngineState::Ready,
            None => EngineState::Uninitialized,
        }
    }

    fn process(&mut self, scan: &ConvertedScan) -> Result<(), EngineFailure> {
        if !scan.pose.is_finite() {
            return Err(EngineFailure::new(format!(
                "non-finite pose hint {:?} for scan at {:?}",
                scan.pose, scan.stamp
            )));
        }

        let map = self.map.get_or_insert_with(GlobalMap::default);
        map.global_points
            .extend(scan.points.iter().map(|point| scan.pose.transform_point(point)));
        map.poses.push(scan.pose);
        map.last_pose_index = Some(map.poses.len() - 1);

        Ok(())
    }

    fn map_snapshot(&self) -> Option<&GlobalMap> {
        self.map.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn scan(stamp_ms: u64, pose: Pose2D, points: &[(f64, f64)]) -> ConvertedScan {
        ConvertedScan {
            stamp: Duration::from_millis(stamp_ms),
            pose,
            points: points.iter().map(|&(x, y)| Point2D::new(x, y)).collect(),
        }
    }

    #[test]
    fn test_engine_starts_uninitialized() {
        let engine = DeadReckoningEngine::new();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(engine.map_snapshot().is_none());
    }

    #[test]
    fn test_first_process_transitions_to_ready() {
        let mut engine = DeadReckoningEngine::new();
        engine.process(&scan(100, Pose2D::identity(), &[])).unwrap();

        assert_eq!(engine.state(), EngineState::Ready);
        let map = engine.map_snapshot().unwrap();
        assert!(map.global_points.is_empty());
        assert_eq!(map.poses.len(), 1);
        assert_eq!(map.last_pose(), Some(&Pose2D::identity()));
    }

    #[test]
    fn test_points_are_moved_into_map_frame() {
        let mut engine = DeadReckoningEngine::new();
        engine
            .process(&scan(100, Pose2D::new(1.0, 0.0, 90.0), &[(1.0, 0.0)]))
            .unwrap();
        engine
            .process(&scan(200, Pose2D::new(2.0, 0.0, 0.0), &[(1.0, 1.0)]))
            .unwrap();

        let map = engine.map_snapshot().unwrap();
        assert_eq!(map.global_points.len(), 2);
        assert_relative_eq!(map.global_points[0].x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(map.global_points[0].y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(map.global_points[1].x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(map.global_points[1].y, 1.0, epsilon = 1e-12);
        assert_eq!(map.last_pose_index, Some(1));
        assert_eq!(map.last_pose(), Some(&Pose2D::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_non_finite_pose_fails_without_mutation() {
        let mut engine = DeadReckoningEngine::new();
        let err = engine
            .process(&scan(100, Pose2D::new(f64::NAN, 0.0, 0.0), &[(1.0, 0.0)]))
            .unwrap_err();

        assert!(err.to_string().contains("non-finite"));
        assert_eq!(engine.state(), EngineState::Uninitialized);
    }

    #[test]
    fn test_last_pose_out_of_range_index() {
        let map = GlobalMap {
            global_points: vec![],
            poses: vec![Pose2D::identity()],
            last_pose_index: Some(3),
        };
        assert!(map.last_pose().is_none());
    }
}
