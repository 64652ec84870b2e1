use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use parking_lot::Mutex;
use scanmap_core::{
    Artifact, ArtifactSink, ConvertedScan, EngineFailure, EngineState, GlobalMap, MappingEngine,
    Point2D, Pose2D, RawScan, SharedScanQueue, StampedTransform, TransformLookup,
    TransformUnavailable,
};
use std::{collections::HashMap, num::NonZeroUsize, sync::Arc, time::Duration};

#[allow(dead_code)]
pub fn create_queue(capacity: usize) -> SharedScanQueue {
    SharedScanQueue::with_capacity(NonZeroUsize::new(capacity).unwrap())
}

/// ScanBuilder for creating raw scans with various characteristics
#[derive(Debug, Clone)]
pub struct ScanBuilder {
    scan: RawScan,
}

impl ScanBuilder {
    pub fn new(stamp_ms: u64) -> Self {
        Self {
            scan: RawScan {
                stamp: Duration::from_millis(stamp_ms),
                frame_id: "laser".to_string(),
                angle_min: 0.0,
                angle_max: 0.0,
                angle_increment: 0.1,
                range_min: 0.1,
                range_max: 10.0,
                ranges: vec![],
            },
        }
    }

    pub fn angles(mut self, angle_min: f64, angle_increment: f64) -> Self {
        self.scan.angle_min = angle_min;
        self.scan.angle_increment = angle_increment;
        self
    }

    pub fn limits(mut self, range_min: f64, range_max: f64) -> Self {
        self.scan.range_min = range_min;
        self.scan.range_max = range_max;
        self
    }

    pub fn ranges(mut self, ranges: &[f64]) -> Self {
        self.scan.ranges = ranges.to_vec();
        self
    }

    pub fn build(mut self) -> RawScan {
        let count = self.scan.ranges.len().saturating_sub(1) as f64;
        self.scan.angle_max = self.scan.angle_min + self.scan.angle_increment * count;
        self.scan
    }
}

/// A scan with two in-range samples.
pub fn two_point_scan(stamp_ms: u64) -> RawScan {
    ScanBuilder::new(stamp_ms)
        .angles(0.0, std::f64::consts::FRAC_PI_2)
        .ranges(&[1.0, 2.0])
        .build()
}

#[allow(dead_code)]
pub fn converted_scan(stamp_ms: u64, pose: Pose2D, points: &[(f64, f64)]) -> ConvertedScan {
    ConvertedScan {
        stamp: Duration::from_millis(stamp_ms),
        pose,
        points: points.iter().map(|&(x, y)| Point2D::new(x, y)).collect(),
    }
}

#[allow(dead_code)]
pub fn planar(x: f64, y: f64, yaw_deg: f64) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::new(x, y, 0.0),
        UnitQuaternion::from_euler_angles(0.0, 0.0, yaw_deg.to_radians()),
    )
}

#[allow(dead_code)]
pub fn odom_sample(stamp_ms: u64, transform: Isometry3<f64>) -> StampedTransform {
    StampedTransform {
        stamp: Duration::from_millis(stamp_ms),
        parent: "odom".to_string(),
        child: "base_link".to_string(),
        transform,
    }
}

/// Engine with scripted behavior that records every processed scan.
///
/// Each processed scan appends its pose hint, shifted by `correction`,
/// to the trajectory, like an engine refining the hint.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    pub map: Option<GlobalMap>,
    pub processed: Vec<ConvertedScan>,
    pub correction: (f64, f64, f64),
    pub fail_on_call: Option<usize>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn with_correction(mut self, dx: f64, dy: f64, dth: f64) -> Self {
        self.correction = (dx, dy, dth);
        self
    }

    #[allow(dead_code)]
    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }
}

impl MappingEngine for ScriptedEngine {
    fn state(&self) -> EngineState {
        if self.map.is_some() {
            EngineState::Ready
        } else {
            EngineState::Uninitialized
        }
    }

    fn process(&mut self, scan: &ConvertedScan) -> Result<(), EngineFailure> {
        if self.fail_on_call == Some(self.processed.len()) {
            return Err(EngineFailure::new("scripted failure"));
        }

        let (dx, dy, dth) = self.correction;
        let pose = Pose2D::new(
            scan.pose.tx() + dx,
            scan.pose.ty() + dy,
            scan.pose.heading() + dth,
        );

        let map = self.map.get_or_insert_with(GlobalMap::default);
        map.global_points
            .extend(scan.points.iter().map(|point| pose.transform_point(point)));
        map.poses.push(pose);
        map.last_pose_index = Some(map.poses.len() - 1);

        self.processed.push(scan.clone());
        Ok(())
    }

    fn map_snapshot(&self) -> Option<&GlobalMap> {
        self.map.as_ref()
    }
}

/// Sink that records published artifacts, optionally failing on a kind.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub published: Arc<Mutex<Vec<Artifact>>>,
    pub reject_kind: Option<&'static str>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn rejecting(kind: &'static str) -> Self {
        Self {
            reject_kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.published.lock().clone()
    }

    #[allow(dead_code)]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.published.lock().iter().map(|a| a.kind()).collect()
    }
}

impl ArtifactSink for RecordingSink {
    fn publish(&mut self, artifact: Artifact) -> eyre::Result<()> {
        if self.reject_kind == Some(artifact.kind()) {
            eyre::bail!("transport rejected {}", artifact.kind());
        }
        self.published.lock().push(artifact);
        Ok(())
    }
}

/// Transform lookup answering from a fixed table keyed by stamp.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct ScriptedLookup {
    pub answers: HashMap<Duration, Isometry3<f64>>,
}

#[allow(dead_code)]
impl ScriptedLookup {
    pub fn with(mut self, stamp_ms: u64, transform: Isometry3<f64>) -> Self {
        self.answers.insert(Duration::from_millis(stamp_ms), transform);
        self
    }
}

impl TransformLookup for ScriptedLookup {
    fn lookup(
        &self,
        target_frame: &str,
        source_frame: &str,
        stamp: Duration,
    ) -> Result<Isometry3<f64>, TransformUnavailable> {
        self.answers.get(&stamp).copied().ok_or_else(|| {
            TransformUnavailable::Disconnected {
                target_frame: target_frame.to_string(),
                source_frame: source_frame.to_string(),
            }
        })
    }
}
