use scanmap_core::{BoundedScanQueue, Empty, SharedScanQueue};
use std::{num::NonZeroUsize, thread};

fn bounded(capacity: usize) -> BoundedScanQueue<u64> {
    BoundedScanQueue::with_capacity(NonZeroUsize::new(capacity).unwrap())
}

#[test]
fn test_overflow_retains_most_recent_in_order() {
    // For every overflow amount, the queue holds exactly the last
    // `capacity` pushes in arrival order.
    for capacity in [1, 2, 7, 16] {
        for pushes in [capacity + 1, capacity * 2, capacity * 5 + 3] {
            let mut queue = bounded(capacity);
            for item in 0..pushes as u64 {
                queue.push(item);
            }

            let expected: Vec<u64> = ((pushes - capacity) as u64..pushes as u64).collect();
            let retained: Vec<u64> = queue.iter().copied().collect();
            assert_eq!(retained, expected, "capacity={capacity} pushes={pushes}");
            assert_eq!(queue.len(), capacity);
            assert_eq!(queue.evicted(), (pushes - capacity) as u64);
        }
    }
}

#[test]
fn test_pop_on_empty_leaves_queue_empty() {
    let mut queue = bounded(3);
    queue.push(1);
    assert_eq!(queue.pop_front(), Ok(1));

    for _ in 0..3 {
        assert_eq!(queue.pop_front(), Err(Empty));
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }
}

#[test]
fn test_interleaved_push_and_pop() {
    let mut queue = bounded(2);
    queue.push(1);
    queue.push(2);
    assert_eq!(queue.pop_front(), Ok(1));
    queue.push(3);
    assert_eq!(queue.push(4), Some(2));
    assert_eq!(queue.pop_front(), Ok(3));
    assert_eq!(queue.pop_front(), Ok(4));
    assert_eq!(queue.pop_front(), Err(Empty));
}

#[test]
fn test_concurrent_producer_and_consumer_preserve_fifo() {
    // A producer thread pushes increasing numbers while the consumer pops;
    // whatever survives eviction must still come out in increasing order
    // and the queue must never exceed its capacity.
    const CAPACITY: usize = 8;
    const TOTAL: u64 = 20_000;

    let queue: SharedScanQueue<u64> =
        SharedScanQueue::with_capacity(NonZeroUsize::new(CAPACITY).unwrap());
    let producer_queue = queue.clone();

    let producer = thread::spawn(move || {
        for item in 0..TOTAL {
            producer_queue.push(item);
            assert!(producer_queue.len() <= CAPACITY);
        }
    });

    let mut received = Vec::new();
    loop {
        match queue.pop_front() {
            Ok(item) => received.push(item),
            Err(Empty) if producer.is_finished() && queue.is_empty() => break,
            Err(Empty) => thread::yield_now(),
        }
    }
    producer.join().unwrap();

    assert!(received.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(received.last(), Some(&(TOTAL - 1)));
    assert_eq!(received.len() as u64 + queue.evicted(), TOTAL);
}
