//! Strategies that attach a pose estimate to an incoming scan.
//!
//! The strategy is chosen once when the pipeline is built:
//!
//! - [ExternalPoseResolver] asks a [TransformLookup] for the sensor pose
//!   at the scan's timestamp and fails when it cannot be answered.
//! - [EnginePoseResolver] seeds each scan with the mapping engine's last
//!   accepted pose. The engine refines the seed itself.

use crate::{
    error::TransformUnavailable,
    transform::TransformLookup,
    types::{Pose2D, RawScan},
};
use tokio::sync::watch;

/// Supplies the pose to attach to a converted scan.
pub trait PoseResolver: Send {
    fn resolve(&self, scan: &RawScan) -> Result<Pose2D, TransformUnavailable>;
}

impl<R> PoseResolver for Box<R>
where
    R: PoseResolver + ?Sized,
{
    fn resolve(&self, scan: &RawScan) -> Result<Pose2D, TransformUnavailable> {
        (**self).resolve(scan)
    }
}

/// Looks up the sensor pose in a fixed reference frame.
#[derive(Debug)]
pub struct ExternalPoseResolver<L>
where
    L: TransformLookup,
{
    lookup: L,
    reference_frame: String,
    sensor_frame: String,
}

impl<L> ExternalPoseResolver<L>
where
    L: TransformLookup,
{
    pub fn new(lookup: L, reference_frame: impl Into<String>, sensor_frame: impl Into<String>) -> Self {
        Self {
            lookup,
            reference_frame: reference_frame.into(),
            sensor_frame: sensor_frame.into(),
        }
    }

    pub fn reference_frame(&self) -> &str {
        &self.reference_frame
    }

    pub fn sensor_frame(&self) -> &str {
        &self.sensor_frame
    }
}

impl<L> PoseResolver for ExternalPoseResolver<L>
where
    L: TransformLookup,
{
    fn resolve(&self, scan: &RawScan) -> Result<Pose2D, TransformUnavailable> {
        let transform = self
            .lookup
            .lookup(&self.reference_frame, &self.sensor_frame, scan.stamp)?;
        Ok(Pose2D::from_isometry(&transform))
    }
}

/// Publishes the engine's last accepted pose to an [EnginePoseResolver].
///
/// Owned by the consumer, which updates it after every processed scan.
#[derive(Debug)]
pub struct EnginePoseFeed {
    tx: watch::Sender<Option<Pose2D>>,
}

impl EnginePoseFeed {
    pub fn update(&self, last_pose: Option<Pose2D>) {
        self.tx.send_replace(last_pose);
    }

    /// Creates another resolver reading from this feed.
    pub fn resolver(&self) -> EnginePoseResolver {
        EnginePoseResolver {
            rx: self.tx.subscribe(),
        }
    }
}

/// Seeds scans with the mapping engine's last accepted pose.
///
/// Until the engine has processed its first scan there is no last pose,
/// and the identity pose is used. This never fails.
#[derive(Debug, Clone)]
pub struct EnginePoseResolver {
    rx: watch::Receiver<Option<Pose2D>>,
}

impl PoseResolver for EnginePoseResolver {
    fn resolve(&self, _scan: &RawScan) -> Result<Pose2D, TransformUnavailable> {
        let last_pose = *self.rx.borrow();
        Ok(last_pose.unwrap_or_else(Pose2D::identity))
    }
}

/// Creates a connected feed and resolver pair with no pose yet.
pub fn engine_pose_channel() -> (EnginePoseFeed, EnginePoseResolver) {
    let (tx, rx) = watch::channel(None);
    (EnginePoseFeed { tx }, EnginePoseResolver { rx })
}
