//! Recycled frame delivery
//!
//! - [`RecyclingPool`] - Fixed set of pre-allocated buffers
//! - [`FrameQueue`] - Bounded evicting queue from producer to consumer
//! - [`FrameBuffer`] - Standard image payload
//!
//! The producer (pipeline thread) fills buffers acquired from the queue and
//! posts them; the consumer (presentation thread) polls and releases them.
//! A stalled consumer eventually exhausts the pool and, under the blocking
//! policy, stalls the producer instead of growing memory.

pub mod buffer;
pub mod pool;
pub mod queue;

pub use buffer::FrameBuffer;
pub use pool::{AcquirePolicy, Frame, PoolStats, RecyclingPool};
pub use queue::{FrameQueue, QueueStats, POOL_HEADROOM};
