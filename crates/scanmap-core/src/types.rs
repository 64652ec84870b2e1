use nalgebra::{Isometry3, Rotation2, Vector2};
use std::time::Duration;

/// A Cartesian point in the sensor's local frame, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance from the frame origin.
    pub fn range(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// A 2D rigid-body pose with its heading kept in degrees.
///
/// The rotation matrix derived from the heading is cached alongside it.
/// Fields are private so that every mutation goes through a method that
/// recomputes the matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    tx: f64,
    ty: f64,
    th: f64,
    rmat: Rotation2<f64>,
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose2D {
    /// Creates a pose from a translation and a heading in degrees.
    pub fn new(tx: f64, ty: f64, th_deg: f64) -> Self {
        Self {
            tx,
            ty,
            th: th_deg,
            rmat: Rotation2::new(th_deg.to_radians()),
        }
    }

    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Projects a 3D rigid transform onto the plane: translation (x, y)
    /// and the yaw of its rotation.
    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        let (_roll, _pitch, yaw) = iso.rotation.euler_angles();
        Self::new(iso.translation.x, iso.translation.y, yaw.to_degrees())
    }

    pub fn tx(&self) -> f64 {
        self.tx
    }

    pub fn ty(&self) -> f64 {
        self.ty
    }

    /// Heading in degrees.
    pub fn heading(&self) -> f64 {
        self.th
    }

    pub fn heading_rad(&self) -> f64 {
        self.th.to_radians()
    }

    /// The cached rotation matrix for the current heading.
    pub fn rotation(&self) -> &Rotation2<f64> {
        &self.rmat
    }

    pub fn set(&mut self, tx: f64, ty: f64, th_deg: f64) {
        *self = Self::new(tx, ty, th_deg);
    }

    pub fn set_heading(&mut self, th_deg: f64) {
        self.th = th_deg;
        self.rmat = Rotation2::new(th_deg.to_radians());
    }

    /// True when translation and heading are all finite.
    pub fn is_finite(&self) -> bool {
        self.tx.is_finite() && self.ty.is_finite() && self.th.is_finite()
    }

    /// Maps a point from this pose's local frame into the parent frame.
    pub fn transform_point(&self, point: &Point2D) -> Point2D {
        let v = self.rmat * Vector2::new(point.x, point.y);
        Point2D::new(v.x + self.tx, v.y + self.ty)
    }
}

/// One full rotation of range samples from the laser sensor.
///
/// Sample `i` was taken at `angle_min + i * angle_increment` radians.
#[derive(Debug, Clone, PartialEq)]
pub struct RawScan {
    /// Acquisition time of the first sample.
    pub stamp: Duration,
    /// Frame the ranges are expressed in.
    pub frame_id: String,
    pub angle_min: f64,
    pub angle_max: f64,
    pub angle_increment: f64,
    /// Exclusive lower bound of valid ranges, in meters.
    pub range_min: f64,
    /// Exclusive upper bound of valid ranges, in meters.
    pub range_max: f64,
    pub ranges: Vec<f64>,
}

impl RawScan {
    /// Iterates `(angle, range)` pairs for every sample, valid or not.
    pub fn samples(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.ranges
            .iter()
            .enumerate()
            .map(|(index, &range)| (self.angle_min + self.angle_increment * index as f64, range))
    }

    /// Checks the strict `(range_min, range_max)` validity bound.
    ///
    /// NaN never passes.
    pub fn is_valid_range(&self, range: f64) -> bool {
        self.range_min < range && range < self.range_max
    }
}

/// A filtered point set paired with the pose it was taken from.
///
/// This is the unit that travels through the scan queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedScan {
    pub stamp: Duration,
    pub pose: Pose2D,
    pub points: Vec<Point2D>,
}
