//! Error taxonomy of the scan pipeline.

use std::time::Duration;

/// A pose lookup in the transform buffer could not be satisfied.
///
/// The producer recovers from this locally by dropping the scan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformUnavailable {
    /// The frame was never seen by the buffer.
    #[error("frame '{frame}' does not exist in the transform tree")]
    UnknownFrame { frame: String },

    /// Both frames exist but belong to different trees.
    #[error("frames '{target_frame}' and '{source_frame}' are not connected")]
    Disconnected {
        target_frame: String,
        source_frame: String,
    },

    /// The requested time lies outside the buffered history of an edge.
    #[error(
        "lookup of '{child}' in '{parent}' at {stamp:?} requires extrapolation \
         (history covers {earliest:?}..={latest:?})"
    )]
    Extrapolation {
        parent: String,
        child: String,
        stamp: Duration,
        earliest: Duration,
        latest: Duration,
    },

    /// An edge exists but its history has been fully expired.
    #[error("no transform samples buffered from '{parent}' to '{child}'")]
    EmptyHistory { parent: String, child: String },
}

/// Returned by [BoundedScanQueue::pop_front](crate::queue::BoundedScanQueue::pop_front)
/// when there is nothing to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("scan queue is empty")]
pub struct Empty;

/// Failure inside the mapping engine's processing step.
///
/// There is no recovery path for a corrupted map, so this terminates the
/// pipeline.
#[derive(Debug, thiserror::Error)]
#[error("mapping engine failed: {message}")]
pub struct EngineFailure {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl EngineFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
