//! # LiveTune-RS: live field tuning for frame pipelines
//!
//! Lets a presentation thread inspect and edit typed fields of a running
//! pipeline object, while the pipeline delivers rendered frames through a
//! bounded queue of recycled buffers.
//!
//! ## Architecture
//!
//! - **Tuner**: field bindings that keep the pipeline object and its widgets in sync
//! - **Frame**: a fixed pool of buffers and an evicting delivery queue
//! - **Presentation**: the channel of widget refresh tasks and panel mode settings
//! - **Pipeline**: the iteration loop and a demo gradient source
//!
//! ## Configuration
//!
//! Settings are read from TOML; see [`config`] for the default location.
//!
//! ## Example
//!
//! ```
//! use livetune_rs::{
//!     frame::{AcquirePolicy, FrameQueue},
//!     tuner::{AccessorField, FieldRegistry},
//!     types::{FieldKind, FieldValue},
//! };
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! struct Filter {
//!     strength: i64,
//! }
//!
//! let target = Arc::new(Mutex::new(Filter { strength: 3 }));
//! let strength = AccessorField::new(
//!     "strength",
//!     FieldKind::Integer,
//!     &target,
//!     |f: &Filter| FieldValue::Integer(f.strength),
//!     |f, v| {
//!         if let FieldValue::Integer(s) = v {
//!             f.strength = s;
//!         }
//!     },
//! );
//!
//! let registry = FieldRegistry::discover(vec![strength.shared()], None);
//! registry.apply_edit("strength", "0x10").unwrap();
//! assert_eq!(target.lock().strength, 16);
//!
//! let queue = FrameQueue::new(2, AcquirePolicy::Fail, || 0u32).unwrap();
//! queue.produce(|v| *v = 1).unwrap();
//! let frame = queue.poll().unwrap();
//! assert_eq!(*frame, 1);
//! queue.release(frame).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod presentation;
pub mod tuner;
pub mod types;

// Re-export commonly used types
pub use config::TuneConfig;
pub use error::{Result, TuneError};
pub use frame::{AcquirePolicy, Frame, FrameBuffer, FrameQueue, RecyclingPool};
pub use presentation::{PresentationQueue, PresentationScheduler, PresentationTask};
pub use tuner::{AccessorField, FieldBinding, FieldRegistry, VirtualField};
pub use types::{FieldKind, FieldValue};
