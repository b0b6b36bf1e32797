//! Integration tests for the recycling pool and frame queue

mod common;

use common::builders::frame_queue;
use common::test_timeout;
use livetune_rs::{
    frame::{AcquirePolicy, FrameBuffer, FrameQueue, RecyclingPool},
    TuneError,
};
use proptest::prelude::*;
use serial_test::serial;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn test_eviction_keeps_newest_frames() {
    let queue = frame_queue(2, AcquirePolicy::Fail);
    for sequence in 0..5u64 {
        queue.produce(|frame| frame.sequence = sequence).unwrap();
    }

    let stats = queue.stats();
    assert_eq!(stats.queued, 2);
    assert_eq!(stats.posted, 5);
    assert_eq!(stats.evicted, 3);

    let first = queue.poll().unwrap();
    let second = queue.poll().unwrap();
    assert_eq!((first.sequence, second.sequence), (3, 4));
}

#[test]
fn test_stalled_consumer_gets_pool_exhausted() {
    // capacity 1 gives 3 buffers: 1 queued plus 2 held here
    let queue = frame_queue(1, AcquirePolicy::Fail);
    queue.produce(|f| f.sequence = 1).unwrap();
    let reading = queue.poll().unwrap();
    let writing = queue.acquire_for_write().unwrap();
    queue.produce(|f| f.sequence = 2).unwrap();

    assert!(matches!(
        queue.acquire_for_write(),
        Err(TuneError::PoolExhausted { capacity: 3 })
    ));
    // Posting still makes progress by recycling the queued frame
    queue.post(writing).unwrap();
    assert_eq!(queue.stats().evicted, 1);
    queue.release(reading).unwrap();
    assert_eq!(queue.pool().available(), 2);
}

#[test]
fn test_timeout_policy_waits_then_fails() {
    let pool = RecyclingPool::new(1, AcquirePolicy::Timeout { timeout_ms: 20 }, || 0u8).unwrap();
    let _held = pool.acquire().unwrap();

    let started = Instant::now();
    assert!(matches!(pool.acquire(), Err(TuneError::PoolExhausted { .. })));
    assert!(started.elapsed() >= Duration::from_millis(20));
}

#[test]
#[serial]
fn test_blocking_producer_resumes_after_release() {
    let queue = Arc::new(frame_queue(1, AcquirePolicy::Block));
    let held: Vec<_> = (0..3).map(|_| queue.acquire_raw().unwrap()).collect();

    let producer = {
        let queue = queue.clone();
        std::thread::spawn(move || queue.produce(|f| f.sequence = 9))
    };

    std::thread::sleep(test_timeout() / 2);
    assert!(!producer.is_finished());

    drop(held);
    producer.join().unwrap().unwrap();
    assert_eq!(queue.poll().unwrap().sequence, 9);
    assert!(queue.pool().stats().waits >= 1);
}

#[test]
#[serial]
fn test_threaded_producer_consumer() {
    let queue = Arc::new(frame_queue(3, AcquirePolicy::Block));
    const FRAMES: u64 = 200;

    let producer = {
        let queue = queue.clone();
        std::thread::spawn(move || {
            for sequence in 0..FRAMES {
                queue.produce(|f| f.sequence = sequence).unwrap();
            }
        })
    };

    let mut last = None;
    let mut received = 0;
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Some(frame) = queue.poll() {
            // Delivered frames are always in posting order
            if let Some(prev) = last {
                assert!(frame.sequence > prev);
            }
            last = Some(frame.sequence);
            received += 1;
            queue.release(frame).unwrap();
        } else if producer.is_finished() {
            break;
        }
    }
    producer.join().unwrap();
    while let Some(frame) = queue.poll() {
        last = Some(frame.sequence);
        received += 1;
    }

    assert_eq!(last, Some(FRAMES - 1));
    let stats = queue.stats();
    assert_eq!(received as u64 + stats.evicted, FRAMES);
    assert_eq!(queue.pool().available(), queue.pool().capacity());
}

#[test]
fn test_frames_from_other_queue_rejected() {
    let a = frame_queue(2, AcquirePolicy::Fail);
    let b = frame_queue(2, AcquirePolicy::Fail);

    let frame = b.acquire_for_write().unwrap();
    assert!(matches!(a.post(frame), Err(TuneError::ForeignFrame { .. })));

    let frame = b.acquire_for_write().unwrap();
    assert!(matches!(
        a.release(frame),
        Err(TuneError::IllegalRelease { .. })
    ));
    // Rejected frames still find their way home
    assert_eq!(b.pool().available(), b.pool().capacity());
    assert_eq!(a.pool().stats().illegal_releases, 1);
}

#[test]
fn test_buffers_are_reused_not_reallocated() {
    let queue: FrameQueue<FrameBuffer> =
        FrameQueue::new(1, AcquirePolicy::Fail, || FrameBuffer::new(8, 8, 1)).unwrap();
    let mut seen = std::collections::HashSet::new();

    for _ in 0..50 {
        let frame = queue.acquire_for_write().unwrap();
        seen.insert(frame.as_bytes().as_ptr() as usize);
        queue.post(frame).unwrap();
        if let Some(frame) = queue.poll() {
            queue.release(frame).unwrap();
        }
    }
    assert!(seen.len() <= queue.pool().capacity());
}

#[derive(Debug, Clone)]
enum Op {
    Produce,
    Poll,
    PollLatest,
    Release,
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Produce),
        2 => Just(Op::Poll),
        1 => Just(Op::PollLatest),
        2 => Just(Op::Release),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn prop_every_buffer_accounted_for(
        capacity in 1usize..6,
        ops in prop::collection::vec(op_strategy(), 0..80),
    ) {
        let queue = FrameQueue::new(capacity, AcquirePolicy::Fail, || 0u64).unwrap();
        let mut delivered = Vec::new();
        let mut next = 0u64;

        for op in ops {
            match op {
                Op::Produce => {
                    if queue.produce(|v| *v = next).is_ok() {
                        next += 1;
                    }
                }
                Op::Poll => delivered.extend(queue.poll()),
                Op::PollLatest => delivered.extend(queue.poll_latest()),
                Op::Release => {
                    if !delivered.is_empty() {
                        queue.release(delivered.remove(0)).unwrap();
                    }
                }
                Op::Clear => {
                    queue.clear();
                }
            }

            let stats = queue.stats();
            prop_assert!(stats.queued <= capacity);
            prop_assert_eq!(stats.pool.capacity, capacity + 2);
            prop_assert_eq!(stats.pool.free + stats.queued + delivered.len(), stats.pool.capacity);

            let slots = queue.queued_slots();
            let unique: std::collections::HashSet<_> = slots.iter().collect();
            prop_assert_eq!(unique.len(), slots.len());
        }
    }
}
