//! Fixed-capacity recycling pool.
//!
//! All payloads are built up front, so steady-state producers never
//! allocate. Slots live in a fixed array; the free list holds the indices
//! (and payloads) of slots currently in the pool. A checked-out payload
//! travels inside a move-only [`Frame`] handle, which makes it impossible
//! to hold the same slot twice or to touch a slot after returning it.
//!
//! Releasing the same frame twice does not compile:
//!
//! ```compile_fail
//! use livetune_rs::frame::{AcquirePolicy, RecyclingPool};
//!
//! let pool = RecyclingPool::new(1, AcquirePolicy::Fail, || 0u8).unwrap();
//! let frame = pool.acquire().unwrap();
//! pool.release(frame).unwrap();
//! pool.release(frame).unwrap();
//! ```

use crate::error::{Result, TuneError};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// What `acquire` does when every buffer is checked out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AcquirePolicy {
    /// Wait until a buffer is released (producer backpressure)
    #[default]
    Block,
    /// Return [`TuneError::PoolExhausted`] immediately
    Fail,
    /// Wait up to `timeout_ms`, then return [`TuneError::PoolExhausted`]
    Timeout { timeout_ms: u64 },
}

/// Point-in-time pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Buffers owned by the pool, fixed for its lifetime
    pub capacity: usize,
    /// Buffers currently in the pool
    pub free: usize,
    /// Buffers currently held by a queue or a caller
    pub outstanding: usize,
    /// Successful acquisitions since creation
    pub acquisitions: u64,
    /// Acquisitions that had to wait for a release
    pub waits: u64,
    /// Rejected releases since creation
    pub illegal_releases: u64,
}

struct PoolState<T> {
    free: Vec<(usize, T)>,
    in_pool: Vec<bool>,
    acquisitions: u64,
    waits: u64,
    illegal_releases: u64,
}

struct PoolShared<T> {
    id: u64,
    capacity: usize,
    state: Mutex<PoolState<T>>,
    available: Condvar,
}

impl<T> PoolShared<T> {
    fn return_slot(&self, slot: usize, payload: T) -> Result<()> {
        let mut state = self.state.lock();
        let status = state.in_pool.get(slot).copied();
        match status {
            Some(false) => {
                state.in_pool[slot] = true;
                state.free.push((slot, payload));
                drop(state);
                self.available.notify_one();
                Ok(())
            }
            Some(true) => {
                state.illegal_releases += 1;
                tracing::error!("Pool {}: slot {} released while already free", self.id, slot);
                Err(TuneError::IllegalRelease {
                    slot,
                    reason: "slot is already free",
                })
            }
            None => {
                state.illegal_releases += 1;
                tracing::error!("Pool {}: slot {} does not exist", self.id, slot);
                Err(TuneError::IllegalRelease {
                    slot,
                    reason: "slot does not belong to this pool",
                })
            }
        }
    }
}

/// A checked-out buffer.
///
/// Dereferences to the payload. Give it back with
/// [`RecyclingPool::release`]; if it is dropped instead, it returns to its
/// own pool automatically.
pub struct Frame<T> {
    slot: usize,
    payload: Option<T>,
    home: Arc<PoolShared<T>>,
}

impl<T> Frame<T> {
    /// Slot index within the owning pool
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Identifier of the owning pool
    pub fn pool_id(&self) -> u64 {
        self.home.id
    }

    /// Whether this frame was acquired from `pool`
    pub fn belongs_to(&self, pool: &RecyclingPool<T>) -> bool {
        Arc::ptr_eq(&self.home, &pool.shared)
    }

    fn take_payload(&mut self) -> Option<T> {
        self.payload.take()
    }
}

impl<T> Deref for Frame<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.payload
            .as_ref()
            .expect("frame payload is present until the frame is returned")
    }
}

impl<T> DerefMut for Frame<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.payload
            .as_mut()
            .expect("frame payload is present until the frame is returned")
    }
}

impl<T> Drop for Frame<T> {
    fn drop(&mut self) {
        if let Some(payload) = self.payload.take() {
            tracing::trace!("Frame slot {} dropped, returning to pool {}", self.slot, self.home.id);
            let _ = self.home.return_slot(self.slot, payload);
        }
    }
}

impl<T> std::fmt::Debug for Frame<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("pool", &self.home.id)
            .field("slot", &self.slot)
            .finish()
    }
}

/// Fixed set of pre-allocated buffers, handed out and returned.
///
/// Cloning yields another handle to the same pool.
pub struct RecyclingPool<T> {
    shared: Arc<PoolShared<T>>,
    policy: AcquirePolicy,
}

impl<T> Clone for RecyclingPool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            policy: self.policy,
        }
    }
}

impl<T> RecyclingPool<T> {
    /// Build a pool of `capacity` payloads produced by `factory`
    pub fn new<F>(capacity: usize, policy: AcquirePolicy, mut factory: F) -> Result<Self>
    where
        F: FnMut() -> T,
    {
        if capacity == 0 {
            return Err(TuneError::Config(
                "Pool capacity must be at least 1".to_string(),
            ));
        }

        let free = (0..capacity).map(|slot| (slot, factory())).collect();
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Pool {} allocated {} buffers", id, capacity);

        Ok(Self {
            shared: Arc::new(PoolShared {
                id,
                capacity,
                state: Mutex::new(PoolState {
                    free,
                    in_pool: vec![true; capacity],
                    acquisitions: 0,
                    waits: 0,
                    illegal_releases: 0,
                }),
                available: Condvar::new(),
            }),
            policy,
        })
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn policy(&self) -> AcquirePolicy {
        self.policy
    }

    /// Number of buffers currently in the pool
    pub fn available(&self) -> usize {
        self.shared.state.lock().free.len()
    }

    /// Take a buffer, following the configured policy when none is free
    pub fn acquire(&self) -> Result<Frame<T>> {
        let deadline = match self.policy {
            AcquirePolicy::Timeout { timeout_ms } => {
                Some(Instant::now() + Duration::from_millis(timeout_ms))
            }
            _ => None,
        };

        let mut state = self.shared.state.lock();
        let mut waited = false;
        loop {
            if let Some((slot, payload)) = state.free.pop() {
                state.in_pool[slot] = false;
                state.acquisitions += 1;
                if waited {
                    state.waits += 1;
                }
                return Ok(self.frame(slot, payload));
            }

            match (self.policy, deadline) {
                (AcquirePolicy::Fail, _) => return Err(self.exhausted()),
                (_, Some(deadline)) => {
                    if Instant::now() >= deadline {
                        return Err(self.exhausted());
                    }
                    tracing::trace!("Pool {} exhausted, waiting until deadline", self.shared.id);
                    waited = true;
                    self.shared.available.wait_until(&mut state, deadline);
                }
                _ => {
                    tracing::trace!("Pool {} exhausted, blocking", self.shared.id);
                    waited = true;
                    self.shared.available.wait(&mut state);
                }
            }
        }
    }

    /// Take a buffer if one is free, never waiting
    pub fn try_acquire(&self) -> Option<Frame<T>> {
        let mut state = self.shared.state.lock();
        let (slot, payload) = state.free.pop()?;
        state.in_pool[slot] = false;
        state.acquisitions += 1;
        Some(self.frame(slot, payload))
    }

    /// Return a buffer.
    ///
    /// A frame acquired from a different pool is rejected with
    /// [`TuneError::IllegalRelease`]; this pool's free set is untouched and
    /// the frame goes back to the pool it came from.
    pub fn release(&self, mut frame: Frame<T>) -> Result<()> {
        if !frame.belongs_to(self) {
            self.shared.state.lock().illegal_releases += 1;
            tracing::error!(
                "Pool {}: rejected release of slot {} from pool {}",
                self.shared.id,
                frame.slot,
                frame.pool_id()
            );
            return Err(TuneError::IllegalRelease {
                slot: frame.slot,
                reason: "frame was acquired from a different pool",
            });
        }

        match frame.take_payload() {
            Some(payload) => self.shared.return_slot(frame.slot, payload),
            None => Err(TuneError::IllegalRelease {
                slot: frame.slot,
                reason: "frame has already been returned",
            }),
        }
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();
        PoolStats {
            capacity: self.shared.capacity,
            free: state.free.len(),
            outstanding: self.shared.capacity - state.free.len(),
            acquisitions: state.acquisitions,
            waits: state.waits,
            illegal_releases: state.illegal_releases,
        }
    }

    fn frame(&self, slot: usize, payload: T) -> Frame<T> {
        Frame {
            slot,
            payload: Some(payload),
            home: self.shared.clone(),
        }
    }

    fn exhausted(&self) -> TuneError {
        TuneError::PoolExhausted {
            capacity: self.shared.capacity,
        }
    }
}

impl<T> std::fmt::Debug for RecyclingPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecyclingPool")
            .field("id", &self.shared.id)
            .field("capacity", &self.shared.capacity)
            .field("policy", &self.policy)
            .finish()
    }
}
