//! Bounded, evicting delivery queue backed by a recycling pool.
//!
//! The producer posts filled frames; the consumer polls them. When the queue
//! is full, posting evicts the oldest frame and returns it to the pool in the
//! same critical section, so memory stays bounded regardless of producer
//! rate and the newest frames are favoured.
//!
//! The pool holds `capacity + 2` buffers: one the producer is filling and one
//! the consumer is reading, beyond the `capacity` queued.
//!
//! # Frame lifecycle
//!
//! ```text
//! Free ──acquire──► CheckedOut ──post──► Queued ──evict──► Free
//!                                           │
//!                                           └──poll──► Delivered ──release──► Free
//! ```

use super::pool::{AcquirePolicy, Frame, PoolStats, RecyclingPool};
use crate::error::{Result, TuneError};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Frames the pool holds beyond the queue capacity
pub const POOL_HEADROOM: usize = 2;

/// Point-in-time queue counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub capacity: usize,
    pub queued: usize,
    pub posted: u64,
    pub evicted: u64,
    pub delivered: u64,
    pub pool: PoolStats,
}

struct QueueState<T> {
    frames: VecDeque<Frame<T>>,
    posted: u64,
    evicted: u64,
    delivered: u64,
}

/// Delivers the producer's most recent frames to a consumer
pub struct FrameQueue<T> {
    capacity: usize,
    pool: RecyclingPool<T>,
    state: Mutex<QueueState<T>>,
}

impl<T> FrameQueue<T> {
    /// Create a queue of `capacity` frames and a pool of `capacity + 2`
    pub fn new<F>(capacity: usize, policy: AcquirePolicy, factory: F) -> Result<Self>
    where
        F: FnMut() -> T,
    {
        if capacity == 0 {
            return Err(TuneError::Config(
                "Frame queue capacity must be at least 1".to_string(),
            ));
        }
        let pool = RecyclingPool::new(capacity + POOL_HEADROOM, policy, factory)?;
        tracing::debug!(
            "Frame queue created: capacity {}, pool {} ({} buffers)",
            capacity,
            pool.id(),
            pool.capacity()
        );

        Ok(Self {
            capacity,
            pool,
            state: Mutex::new(QueueState {
                frames: VecDeque::with_capacity(capacity),
                posted: 0,
                evicted: 0,
                delivered: 0,
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The backing pool
    pub fn pool(&self) -> &RecyclingPool<T> {
        &self.pool
    }

    /// Take a buffer for the producer to fill in place
    pub fn acquire_for_write(&self) -> Result<Frame<T>> {
        self.pool.acquire()
    }

    /// Take a scratch buffer that will never be posted
    pub fn acquire_raw(&self) -> Result<Frame<T>> {
        self.pool.acquire()
    }

    /// Enqueue a filled frame, evicting the oldest one when full
    pub fn post(&self, frame: Frame<T>) -> Result<()> {
        if !frame.belongs_to(&self.pool) {
            return Err(TuneError::ForeignFrame {
                frame_pool: frame.pool_id(),
                queue_pool: self.pool.id(),
            });
        }

        let mut state = self.state.lock();
        if state.frames.len() >= self.capacity {
            if let Some(oldest) = state.frames.pop_front() {
                tracing::trace!("Evicting frame slot {}", oldest.slot());
                state.evicted += 1;
                self.pool.release(oldest)?;
            }
        }
        state.frames.push_back(frame);
        state.posted += 1;
        Ok(())
    }

    /// Acquire a buffer, fill it with `fill`, and post it
    pub fn produce<F>(&self, fill: F) -> Result<()>
    where
        F: FnOnce(&mut T),
    {
        let mut frame = self.acquire_for_write()?;
        fill(&mut *frame);
        self.post(frame)
    }

    /// Take the oldest queued frame, if any. Never blocks.
    ///
    /// The caller owns the returned frame and must release it.
    pub fn poll(&self) -> Option<Frame<T>> {
        let mut state = self.state.lock();
        let frame = state.frames.pop_front()?;
        state.delivered += 1;
        Some(frame)
    }

    /// Take the newest queued frame, returning every older one to the pool
    pub fn poll_latest(&self) -> Option<Frame<T>> {
        let mut state = self.state.lock();
        let newest = state.frames.pop_back()?;
        while let Some(stale) = state.frames.pop_front() {
            state.evicted += 1;
            // Stale frames came from this pool, so release cannot fail
            let _ = self.pool.release(stale);
        }
        state.delivered += 1;
        Some(newest)
    }

    /// Return a consumed frame to the pool
    pub fn release(&self, frame: Frame<T>) -> Result<()> {
        self.pool.release(frame)
    }

    /// Return every queued frame to the pool
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let count = state.frames.len();
        for frame in state.frames.drain(..) {
            let _ = self.pool.release(frame);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.state.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().frames.is_empty()
    }

    /// Slots of queued frames, oldest first
    pub fn queued_slots(&self) -> Vec<usize> {
        self.state.lock().frames.iter().map(Frame::slot).collect()
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            capacity: self.capacity,
            queued: state.frames.len(),
            posted: state.posted,
            evicted: state.evicted,
            delivered: state.delivered,
            pool: self.pool.stats(),
        }
    }
}

impl<T> std::fmt::Debug for FrameQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameQueue")
            .field("capacity", &self.capacity)
            .field("queued", &self.len())
            .field("pool", &self.pool)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(capacity: usize) -> FrameQueue<u32> {
        FrameQueue::new(capacity, AcquirePolicy::Fail, || 0).unwrap()
    }

    #[test]
    fn test_pool_has_headroom() {
        let q = queue(3);
        assert_eq!(q.pool().capacity(), 5);
    }

    #[test]
    fn test_eviction_returns_oldest_to_pool() {
        let q = queue(2);
        let a = q.acquire_for_write().unwrap();
        let b = q.acquire_for_write().unwrap();
        let c = q.acquire_for_write().unwrap();
        let (sa, sb, sc) = (a.slot(), b.slot(), c.slot());

        q.post(a).unwrap();
        q.post(b).unwrap();
        let free_before = q.pool().available();
        q.post(c).unwrap();

        assert_eq!(q.queued_slots(), vec![sb, sc]);
        assert_eq!(q.pool().available(), free_before + 1);
        assert_eq!(q.stats().evicted, 1);

        // A is the most recently freed slot, so it is handed out next
        let next = q.acquire_raw().unwrap();
        assert_eq!(next.slot(), sa);
    }

    #[test]
    fn test_poll_fifo_and_empty() {
        let q = queue(4);
        q.produce(|v| *v = 1).unwrap();
        q.produce(|v| *v = 2).unwrap();

        let first = q.poll().unwrap();
        assert_eq!(*first, 1);
        q.release(first).unwrap();
        assert_eq!(*q.poll().unwrap(), 2);
        assert!(q.poll().is_none());
    }

    #[test]
    fn test_poll_latest_discards_older() {
        let q = queue(4);
        for i in 0..3 {
            q.produce(|v| *v = i).unwrap();
        }
        let latest = q.poll_latest().unwrap();
        assert_eq!(*latest, 2);
        assert!(q.is_empty());
        assert_eq!(q.pool().available(), q.pool().capacity() - 1);
    }

    #[test]
    fn test_foreign_frame_rejected() {
        let q = queue(2);
        let other = queue(2);
        let frame = other.acquire_for_write().unwrap();

        assert!(matches!(q.post(frame), Err(TuneError::ForeignFrame { .. })));
        assert!(q.is_empty());
        assert_eq!(other.pool().available(), other.pool().capacity());
    }

    #[test]
    fn test_clear() {
        let q = queue(3);
        for _ in 0..3 {
            q.produce(|_| {}).unwrap();
        }
        assert_eq!(q.clear(), 3);
        assert_eq!(q.pool().available(), q.pool().capacity());
    }

    #[test]
    fn test_accounting_invariant() {
        let q = queue(2);
        let mut delivered = Vec::new();
        for i in 0..10 {
            q.produce(|v| *v = i).unwrap();
            if i % 3 == 0 {
                if let Some(frame) = q.poll() {
                    delivered.push(frame);
                }
            }
            let stats = q.stats();
            assert!(stats.queued <= stats.capacity);
            assert_eq!(
                stats.pool.free + stats.queued + delivered.len(),
                stats.pool.capacity
            );
            if delivered.len() > 1 {
                q.release(delivered.remove(0)).unwrap();
            }
        }
    }
}
