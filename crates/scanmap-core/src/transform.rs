//! Time-buffered rigid transforms between coordinate frames.
//!
//! Frames form a tree where every child frame has exactly one parent.
//! Each parent/child edge keeps a short history of stamped samples, and a
//! lookup composes the edges between two frames at a given time,
//! interpolating between the samples that bracket it.

use crate::error::TransformUnavailable;
use nalgebra::Isometry3;
use parking_lot::RwLock;
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};
use tracing::debug;

/// Default length of history kept per edge.
pub const DEFAULT_CACHE_TIME: Duration = Duration::from_secs(10);

/// Resolves the pose of one frame relative to another at a given time.
pub trait TransformLookup: Send + Sync {
    /// Returns the transform mapping coordinates in `source_frame` into
    /// `target_frame`, i.e. the pose of `source_frame` seen from
    /// `target_frame`, at time `stamp`.
    ///
    /// A zero `stamp` asks for the latest time available on every edge
    /// involved.
    fn lookup(
        &self,
        target_frame: &str,
        source_frame: &str,
        stamp: Duration,
    ) -> Result<Isometry3<f64>, TransformUnavailable>;
}

/// One sample of the pose of `child` within `parent`.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedTransform {
    pub stamp: Duration,
    pub parent: String,
    pub child: String,
    pub transform: Isometry3<f64>,
}

#[derive(Debug)]
struct Edge {
    parent: String,
    is_static: bool,
    /// Sorted by stamp, oldest first.
    samples: VecDeque<(Duration, Isometry3<f64>)>,
}

impl Edge {
    fn new(parent: String, is_static: bool) -> Self {
        Self {
            parent,
            is_static,
            samples: VecDeque::new(),
        }
    }

    fn latest_stamp(&self) -> Option<Duration> {
        self.samples.back().map(|(stamp, _)| *stamp)
    }

    fn insert(&mut self, stamp: Duration, transform: Isometry3<f64>) {
        if self.is_static {
            self.samples.clear();
            self.samples.push_back((stamp, transform));
            return;
        }

        let index = self.samples.partition_point(|(ts, _)| *ts < stamp);
        match self.samples.get_mut(index) {
            Some((ts, value)) if *ts == stamp => *value = transform,
            _ => self.samples.insert(index, (stamp, transform)),
        }
    }

    /// Drops samples older than `cache_time` before the newest one.
    fn expire(&mut self, cache_time: Duration) -> usize {
        let Some(latest) = self.latest_stamp() else {
            return 0;
        };
        if self.is_static {
            return 0;
        }

        let horizon = latest.saturating_sub(cache_time);
        let mut count = 0;
        while let Some((stamp, _)) = self.samples.front() {
            if *stamp >= horizon {
                break;
            }
            self.samples.pop_front();
            count += 1;
        }
        count
    }

    fn sample_at(
        &self,
        child: &str,
        stamp: Duration,
    ) -> Result<Isometry3<f64>, TransformUnavailable> {
        let (Some((earliest, first)), Some((latest, last))) =
            (self.samples.front(), self.samples.back())
        else {
            return Err(TransformUnavailable::EmptyHistory {
                parent: self.parent.clone(),
                child: child.to_string(),
            });
        };

        if self.is_static || stamp.is_zero() {
            return Ok(*last);
        }

        if stamp < *earliest || stamp > *latest {
            return Err(TransformUnavailable::Extrapolation {
                parent: self.parent.clone(),
                child: child.to_string(),
                stamp,
                earliest: *earliest,
                latest: *latest,
            });
        }

        if stamp == *earliest {
            return Ok(*first);
        }

        // `earliest < stamp <= latest`, so both neighbours exist.
        let upper = self.samples.partition_point(|(ts, _)| *ts < stamp);
        let (t1, after) = self.samples[upper];
        if t1 == stamp {
            return Ok(after);
        }
        let (t0, before) = self.samples[upper - 1];

        let ratio = (stamp - t0).as_secs_f64() / (t1 - t0).as_secs_f64();
        Ok(before.lerp_slerp(&after, ratio))
    }
}

/// A tree of frames with a bounded history per edge.
#[derive(Debug)]
pub struct TransformBuffer {
    cache_time: Duration,
    /// Edges keyed by child frame.
    edges: HashMap<String, Edge>,
}

impl Default for TransformBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TIME)
    }
}

impl TransformBuffer {
    pub fn new(cache_time: Duration) -> Self {
        Self {
            cache_time,
            edges: HashMap::new(),
        }
    }

    pub fn cache_time(&self) -> Duration {
        self.cache_time
    }

    /// Records a time-varying transform sample.
    pub fn insert(&mut self, transform: StampedTransform) {
        self.insert_edge(transform, false);
    }

    /// Records a transform that holds at every time.
    pub fn insert_static(&mut self, transform: StampedTransform) {
        self.insert_edge(transform, true);
    }

    fn insert_edge(&mut self, transform: StampedTransform, is_static: bool) {
        let StampedTransform {
            stamp,
            parent,
            child,
            transform,
        } = transform;

        let edge = self
            .edges
            .entry(child.clone())
            .or_insert_with(|| Edge::new(parent.clone(), is_static));

        if edge.parent != parent || edge.is_static != is_static {
            debug!(
                child = %child,
                old_parent = %edge.parent,
                new_parent = %parent,
                "Re-parenting frame, discarding its history"
            );
            *edge = Edge::new(parent, is_static);
        }

        edge.insert(stamp, transform);
        let expired = edge.expire(self.cache_time);
        if expired > 0 {
            debug!(child = %child, expired, "Expired old transform samples");
        }
    }

    /// Checks whether the frame appears anywhere in the tree.
    pub fn has_frame(&self, frame: &str) -> bool {
        self.edges.contains_key(frame) || self.edges.values().any(|edge| edge.parent == frame)
    }

    /// Lists `frame` followed by its ancestors up to the root.
    fn ancestry<'a>(&'a self, frame: &'a str) -> Vec<&'a str> {
        let mut chain = vec![frame];
        let mut current = frame;

        // An edge count bound guards against cycles from bad input.
        while let Some(edge) = self.edges.get(current) {
            if chain.len() > self.edges.len() {
                break;
            }
            current = edge.parent.as_str();
            chain.push(current);
        }

        chain
    }

    /// Latest time at which every time-varying edge on the path has data.
    fn latest_common_time(&self, children: &[&str]) -> Duration {
        children
            .iter()
            .filter_map(|child| self.edges.get(*child))
            .filter(|edge| !edge.is_static)
            .filter_map(|edge| edge.latest_stamp())
            .min()
            .unwrap_or(Duration::ZERO)
    }

    /// Composes the pose of `chain[0]` in `chain[chain.len() - 1]`.
    fn compose_up(
        &self,
        chain: &[&str],
        stamp: Duration,
    ) -> Result<Isometry3<f64>, TransformUnavailable> {
        let mut acc = Isometry3::identity();
        for child in &chain[..chain.len().saturating_sub(1)] {
            let edge = &self.edges[*child];
            acc = edge.sample_at(child, stamp)? * acc;
        }
        Ok(acc)
    }
}

impl TransformLookup for TransformBuffer {
    fn lookup(
        &self,
        target_frame: &str,
        source_frame: &str,
        stamp: Duration,
    ) -> Result<Isometry3<f64>, TransformUnavailable> {
        if target_frame == source_frame {
            return Ok(Isometry3::identity());
        }

        for frame in [target_frame, source_frame] {
            if !self.has_frame(frame) {
                return Err(TransformUnavailable::UnknownFrame {
                    frame: frame.to_string(),
                });
            }
        }

        let source_chain = self.ancestry(source_frame);
        let target_chain = self.ancestry(target_frame);

        let Some((source_depth, target_depth)) =
            source_chain.iter().enumerate().find_map(|(i, frame)| {
                let j = target_chain.iter().position(|other| other == frame)?;
                Some((i, j))
            })
        else {
            return Err(TransformUnavailable::Disconnected {
                target_frame: target_frame.to_string(),
                source_frame: source_frame.to_string(),
            });
        };

        let source_path = &source_chain[..=source_depth];
        let target_path = &target_chain[..=target_depth];

        let stamp = if stamp.is_zero() {
            let children: Vec<&str> = source_path[..source_depth]
                .iter()
                .chain(&target_path[..target_depth])
                .copied()
                .collect();
            self.latest_common_time(&children)
        } else {
            stamp
        };

        let ancestor_from_source = self.compose_up(source_path, stamp)?;
        let ancestor_from_target = self.compose_up(target_path, stamp)?;

        Ok(ancestor_from_target.inverse() * ancestor_from_source)
    }
}

/// A [TransformBuffer] shared between a writer feeding odometry and the
/// readers resolving scan poses.
#[derive(Debug, Clone, Default)]
pub struct SharedTransformBuffer {
    inner: Arc<RwLock<TransformBuffer>>,
}

impl SharedTransformBuffer {
    pub fn new(cache_time: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TransformBuffer::new(cache_time))),
        }
    }

    pub fn insert(&self, transform: StampedTransform) {
        self.inner.write().insert(transform);
    }

    pub fn insert_static(&self, transform: StampedTransform) {
        self.inner.write().insert_static(transform);
    }
}

impl TransformLookup for SharedTransformBuffer {
    fn lookup(
        &self,
        target_frame: &str,
        source_frame: &str,
        stamp: Duration,
    ) -> Result<Isometry3<f64>, TransformUnavailable> {
        self.inner.read().lookup(target_frame, source_frame, stamp)
    }
}
