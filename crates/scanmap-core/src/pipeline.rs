//! Drives the producer and the consumer on one cooperative event loop.
//!
//! Scan arrivals and publishing ticks are multiplexed with
//! [tokio::select!], so the two callbacks never run at the same time,
//! like on a single-threaded executor. The queue between them is still a
//! [SharedScanQueue], so either side may also be driven from another
//! thread.

use crate::{
    config::{Config, PoseSource},
    consumer::{PublishStats, PublishingConsumer, TickOutcome},
    engine::MappingEngine,
    pose::{ExternalPoseResolver, PoseResolver, engine_pose_channel},
    producer::{IngestStats, IngestionProducer},
    queue::SharedScanQueue,
    sink::ArtifactSink,
    transform::SharedTransformBuffer,
    types::RawScan,
};
use eyre::{Result, WrapErr, ensure};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

/// Summary returned when a pipeline finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub ingest: IngestStats,
    pub publish: PublishStats,
}

/// A producer and a consumer sharing one scan queue.
pub struct Pipeline<R, E, S>
where
    R: PoseResolver,
    E: MappingEngine,
    S: ArtifactSink,
{
    producer: IngestionProducer<R>,
    consumer: PublishingConsumer<E, S>,
    period: Duration,
    transforms: Option<SharedTransformBuffer>,
}

impl<R, E, S> Pipeline<R, E, S>
where
    R: PoseResolver,
    E: MappingEngine,
    S: ArtifactSink,
{
    pub fn new(
        producer: IngestionProducer<R>,
        consumer: PublishingConsumer<E, S>,
        period: Duration,
    ) -> Result<Self> {
        ensure!(!period.is_zero(), "publishing period must be greater than zero");

        Ok(Self {
            producer,
            consumer,
            period,
            transforms: None,
        })
    }

    /// The transform buffer read by the external pose resolver, if that
    /// pose source was selected. Feed it with odometry transforms.
    pub fn transforms(&self) -> Option<&SharedTransformBuffer> {
        self.transforms.as_ref()
    }

    /// Runs until the scan source closes and the queue has drained, or
    /// until the mapping engine fails.
    pub async fn run(self, scans: flume::Receiver<RawScan>) -> Result<PipelineReport> {
        let Self {
            mut producer,
            mut consumer,
            period,
            ..
        } = self;

        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut input_open = true;

        info!(?period, capacity = consumer.queue().capacity(), "Starting scan pipeline");

        loop {
            tokio::select! {
                scan = scans.recv_async(), if input_open => match scan {
                    Ok(scan) => {
                        producer.on_scan(&scan);
                    }
                    Err(_) => {
                        debug!(queued = consumer.queue().len(), "Scan source closed, draining queue");
                        input_open = false;
                    }
                },
                _ = interval.tick() => {
                    let outcome = consumer
                        .tick()
                        .wrap_err("Publishing consumer stopped on engine failure")?;

                    if outcome == TickOutcome::Idle && !input_open {
                        break;
                    }
                }
            }
        }

        let report = PipelineReport {
            ingest: producer.stats(),
            publish: consumer.stats(),
        };
        info!(?report, "Scan pipeline finished");
        Ok(report)
    }
}

impl<E, S> Pipeline<Box<dyn PoseResolver>, E, S>
where
    E: MappingEngine,
    S: ArtifactSink,
{
    /// Wires a pipeline from configuration.
    ///
    /// The pose source is chosen here, once: the external source gets a
    /// fresh [SharedTransformBuffer] reachable through
    /// [transforms](Self::transforms); the engine source gets a pose feed
    /// updated by the consumer.
    pub fn from_config(config: &Config, engine: E, sink: S) -> Result<Self> {
        config.validate()?;

        let queue = SharedScanQueue::with_capacity(config.queue_capacity()?);
        let consumer = PublishingConsumer::new(engine, sink, queue.clone(), &config.frames.map);

        let (resolver, consumer, transforms) = match config.pose_source {
            PoseSource::External => {
                let transforms = SharedTransformBuffer::new(config.transform.cache_time);
                let resolver: Box<dyn PoseResolver> = Box::new(ExternalPoseResolver::new(
                    transforms.clone(),
                    &config.frames.reference,
                    &config.frames.sensor,
                ));
                (resolver, consumer, Some(transforms))
            }
            PoseSource::Engine => {
                let (feed, resolver) = engine_pose_channel();
                let resolver: Box<dyn PoseResolver> = Box::new(resolver);
                (resolver, consumer.with_pose_feed(feed), None)
            }
        };

        info!(
            pose_source = ?config.pose_source,
            map_frame = %config.frames.map,
            capacity = config.queue.capacity,
            period = ?config.publish.period,
            "Configured scan pipeline"
        );

        let producer = IngestionProducer::new(resolver, queue);
        let mut pipeline = Self::new(producer, consumer, config.publish.period)?;
        pipeline.transforms = transforms;
        Ok(pipeline)
    }
}
