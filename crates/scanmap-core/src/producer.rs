use crate::{
    convert::ScanConverter,
    error::TransformUnavailable,
    pose::PoseResolver,
    queue::SharedScanQueue,
    types::RawScan,
};
use tracing::{debug, warn};

/// What happened to one incoming scan.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Queued without displacing anything.
    Enqueued,
    /// Queued after evicting the oldest unconsumed scan.
    EnqueuedWithEviction,
    /// No pose could be resolved; the scan was discarded.
    Dropped(TransformUnavailable),
}

/// Counters kept by the [IngestionProducer].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub received: u64,
    pub enqueued: u64,
    pub dropped_no_pose: u64,
    pub evicted: u64,
}

/// Runs once per incoming scan: resolves its pose, converts it and
/// enqueues the result.
///
/// It never waits on the consumer. Scans whose pose cannot be resolved
/// are logged and dropped rather than reported to the caller.
#[derive(Debug)]
pub struct IngestionProducer<R>
where
    R: PoseResolver,
{
    converter: ScanConverter,
    resolver: R,
    queue: SharedScanQueue,
    stats: IngestStats,
}

impl<R> IngestionProducer<R>
where
    R: PoseResolver,
{
    pub fn new(resolver: R, queue: SharedScanQueue) -> Self {
        Self {
            converter: ScanConverter,
            resolver,
            queue,
            stats: IngestStats::default(),
        }
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    pub fn on_scan(&mut self, scan: &RawScan) -> IngestOutcome {
        self.stats.received += 1;

        let pose = match self.resolver.resolve(scan) {
            Ok(pose) => pose,
            Err(err) => {
                self.stats.dropped_no_pose += 1;
                warn!(
                    stamp = ?scan.stamp,
                    error = %err,
                    dropped = self.stats.dropped_no_pose,
                    "Dropping scan without pose"
                );
                return IngestOutcome::Dropped(err);
            }
        };

        let converted = self.converter.convert(scan, pose);
        let num_points = converted.points.len();
        self.stats.enqueued += 1;

        match self.queue.push(converted) {
            Some(evicted) => {
                self.stats.evicted += 1;
                debug!(
                    evicted_stamp = ?evicted.stamp,
                    total_evicted = self.stats.evicted,
                    "Scan queue full, evicted oldest scan"
                );
                IngestOutcome::EnqueuedWithEviction
            }
            None => {
                debug!(stamp = ?scan.stamp, points = num_points, "Enqueued scan");
                IngestOutcome::Enqueued
            }
        }
    }
}
