use crate::{error::Empty, types::ConvertedScan};
use parking_lot::Mutex;
use std::{collections::VecDeque, num::NonZeroUsize, sync::Arc};

/// Default number of scans held between ingestion and publishing.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// A fixed-capacity FIFO that evicts its oldest entry when full.
///
/// It absorbs the rate mismatch between scan arrival and the publishing
/// timer. Pushing never blocks and never fails; memory stays bounded at
/// the cost of losing the oldest unconsumed scans.
#[derive(Debug)]
pub struct BoundedScanQueue<T = ConvertedScan> {
    buffer: VecDeque<T>,
    capacity: NonZeroUsize,
    evicted: u64,
}

impl<T> BoundedScanQueue<T> {
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.get()),
            capacity,
            evicted: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity.get()
    }

    /// Total number of items evicted since construction.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn front(&self) -> Option<&T> {
        self.buffer.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.buffer.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    /// Appends an item, evicting and returning the oldest one when the
    /// queue is at capacity.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.evicted += 1;
            self.buffer.pop_front()
        } else {
            None
        };

        self.buffer.push_back(item);
        evicted
    }

    /// Removes and returns the oldest item.
    pub fn pop_front(&mut self) -> Result<T, Empty> {
        self.buffer.pop_front().ok_or(Empty)
    }
}

/// A [BoundedScanQueue] handle shared by the producer and the consumer.
///
/// Each operation holds the lock only for the duration of one push or
/// pop, so the eviction-and-insert pair stays atomic when the two sides
/// run on different threads.
#[derive(Debug)]
pub struct SharedScanQueue<T = ConvertedScan> {
    inner: Arc<Mutex<BoundedScanQueue<T>>>,
}

impl<T> Clone for SharedScanQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedScanQueue<T> {
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BoundedScanQueue::with_capacity(capacity))),
        }
    }

    pub fn push(&self, item: T) -> Option<T> {
        self.inner.lock().push(item)
    }

    pub fn pop_front(&self) -> Result<T, Empty> {
        self.inner.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn evicted(&self) -> u64 {
        self.inner.lock().evicted()
    }
}

impl<T> Default for SharedScanQueue<T> {
    fn default() -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_QUEUE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::with_capacity(capacity)
    }
}
