//! Polar to Cartesian conversion of raw laser scans.

use crate::types::{ConvertedScan, Point2D, Pose2D, RawScan};

/// Turns raw range readings into filtered point sets.
///
/// A sample is kept only when its range lies strictly inside
/// `(range_min, range_max)`; out-of-range samples are discarded, never
/// clamped. Sample order is preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanConverter;

impl ScanConverter {
    /// Converts the in-range samples of `scan` to Cartesian points.
    ///
    /// ```text
    /// angle = angle_min + index * angle_increment
    /// x = range * cos(angle)
    /// y = range * sin(angle)
    /// ```
    pub fn to_points(scan: &RawScan) -> Vec<Point2D> {
        scan.samples()
            .filter(|&(_, range)| scan.is_valid_range(range))
            .map(|(angle, range)| {
                let (sin_a, cos_a) = angle.sin_cos();
                Point2D::new(range * cos_a, range * sin_a)
            })
            .collect()
    }

    /// Pairs the converted points of `scan` with a pose estimate.
    pub fn convert(&self, scan: &RawScan, pose: Pose2D) -> ConvertedScan {
        ConvertedScan {
            stamp: scan.stamp,
            pose,
            points: Self::to_points(scan),
        }
    }
}
